//! Validation options
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::catalog::KeywordCatalog;
use crate::context::TraceSink;
use crate::draft::Draft;
use crate::formats::FormatRegistry;
use crate::keywords::data::DataFetcher;
use crate::output::OutputFormat;
use crate::registry::{DocumentFetcher, SchemaRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Default limit on nested schema evaluations
pub const DEFAULT_MAX_TRAVERSAL_DEPTH: usize = 100;

/// Options for a single validation call.
///
/// The plain settings (de)serialize so they can live in a configuration
/// file; the shared tables and injected capabilities are set in code.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Evaluate every schema under this draft, ignoring `$schema`
    pub validate_as: Option<Draft>,
    /// Make `format` assert regardless of vocabularies
    pub require_format_validation: bool,
    /// Fail `format` values no registered format knows
    pub only_known_formats: bool,
    pub output_format: OutputFormat,
    pub max_traversal_depth: usize,
    /// Base URI given to schemas parsed without one
    pub default_base_uri: Option<Url>,
    /// Stop a schema's keywords at the first failure
    pub short_circuit: bool,
    /// Resolve references of the `data` keyword
    pub process_data_references: bool,
    /// Message template overrides keyed by message name
    pub messages: HashMap<String, String>,

    #[serde(skip, default = "default_registry")]
    pub schema_registry: Arc<SchemaRegistry>,
    #[serde(skip, default = "KeywordCatalog::standard")]
    pub catalog: Arc<KeywordCatalog>,
    #[serde(skip, default = "FormatRegistry::shared_standard")]
    pub formats: Arc<FormatRegistry>,
    #[serde(skip)]
    pub fetcher: Option<Arc<dyn DocumentFetcher>>,
    #[serde(skip)]
    pub data_fetcher: Option<Arc<dyn DataFetcher>>,
    #[serde(skip)]
    pub log: Option<Arc<dyn TraceSink>>,
}

fn default_registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::new())
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            validate_as: None,
            require_format_validation: false,
            only_known_formats: false,
            output_format: OutputFormat::default(),
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
            default_base_uri: None,
            short_circuit: false,
            process_data_references: false,
            messages: HashMap::new(),
            schema_registry: default_registry(),
            catalog: KeywordCatalog::standard(),
            formats: FormatRegistry::shared_standard(),
            fetcher: None,
            data_fetcher: None,
            log: None,
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validate_as(mut self, draft: Draft) -> Self {
        self.validate_as = Some(draft);
        self
    }

    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.require_format_validation = enabled;
        self
    }

    pub fn with_only_known_formats(mut self, enabled: bool) -> Self {
        self.only_known_formats = enabled;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_max_traversal_depth(mut self, depth: usize) -> Self {
        self.max_traversal_depth = depth;
        self
    }

    pub fn with_default_base_uri(mut self, uri: Url) -> Self {
        self.default_base_uri = Some(uri);
        self
    }

    pub fn with_short_circuit(mut self, enabled: bool) -> Self {
        self.short_circuit = enabled;
        self
    }

    pub fn with_data_references(mut self, enabled: bool) -> Self {
        self.process_data_references = enabled;
        self
    }

    pub fn with_message(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages.insert(key.into(), template.into());
        self
    }

    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.schema_registry = registry;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<KeywordCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_formats(mut self, formats: Arc<FormatRegistry>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_data_fetcher(mut self, fetcher: Arc<dyn DataFetcher>) -> Self {
        self.data_fetcher = Some(fetcher);
        self
    }

    pub fn with_log(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.log = Some(sink);
        self
    }

    /// Whether evaluation may stop at the first failing keyword
    pub fn short_circuits(&self) -> bool {
        self.short_circuit || self.output_format == OutputFormat::Flag
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("validate_as", &self.validate_as)
            .field("require_format_validation", &self.require_format_validation)
            .field("only_known_formats", &self.only_known_formats)
            .field("output_format", &self.output_format)
            .field("max_traversal_depth", &self.max_traversal_depth)
            .field("default_base_uri", &self.default_base_uri.as_ref().map(Url::as_str))
            .field("short_circuit", &self.short_circuit)
            .field("process_data_references", &self.process_data_references)
            .field("messages", &self.messages.len())
            .field("registered_resources", &self.schema_registry.len())
            .field("keywords", &self.catalog.len())
            .field("fetcher", &self.fetcher.is_some())
            .field("data_fetcher", &self.data_fetcher.is_some())
            .field("log", &self.log.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = ValidationOptions::default();
        assert_eq!(options.max_traversal_depth, 100);
        assert_eq!(options.output_format, OutputFormat::Flag);
        assert!(options.short_circuits());
        assert!(!options
            .with_output_format(OutputFormat::Hierarchical)
            .short_circuits());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: ValidationOptions = serde_json::from_value(json!({
            "validate_as": "draft-07",
            "require_format_validation": true,
            "output_format": "basic",
            "default_base_uri": "http://localhost/"
        }))
        .unwrap();
        assert_eq!(options.validate_as, Some(Draft::Draft7));
        assert!(options.require_format_validation);
        assert_eq!(options.output_format, OutputFormat::Basic);
        assert_eq!(options.max_traversal_depth, DEFAULT_MAX_TRAVERSAL_DEPTH);
        assert!(options.catalog.contains("properties"));
    }
}
