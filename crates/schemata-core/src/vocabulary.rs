//! Vocabulary declarations and keyword gating
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::catalog::KeywordDescriptor;
use serde_json::Value;

/// Vocabulary identifiers understood by this implementation
pub mod uris {
    pub const CORE_2019_09: &str = "https://json-schema.org/draft/2019-09/vocab/core";
    pub const APPLICATOR_2019_09: &str = "https://json-schema.org/draft/2019-09/vocab/applicator";
    pub const VALIDATION_2019_09: &str = "https://json-schema.org/draft/2019-09/vocab/validation";
    pub const META_DATA_2019_09: &str = "https://json-schema.org/draft/2019-09/vocab/meta-data";
    pub const FORMAT_2019_09: &str = "https://json-schema.org/draft/2019-09/vocab/format";
    pub const CONTENT_2019_09: &str = "https://json-schema.org/draft/2019-09/vocab/content";

    pub const CORE_2020_12: &str = "https://json-schema.org/draft/2020-12/vocab/core";
    pub const APPLICATOR_2020_12: &str = "https://json-schema.org/draft/2020-12/vocab/applicator";
    pub const UNEVALUATED_2020_12: &str = "https://json-schema.org/draft/2020-12/vocab/unevaluated";
    pub const VALIDATION_2020_12: &str = "https://json-schema.org/draft/2020-12/vocab/validation";
    pub const META_DATA_2020_12: &str = "https://json-schema.org/draft/2020-12/vocab/meta-data";
    pub const FORMAT_ANNOTATION_2020_12: &str =
        "https://json-schema.org/draft/2020-12/vocab/format-annotation";
    pub const FORMAT_ASSERTION_2020_12: &str =
        "https://json-schema.org/draft/2020-12/vocab/format-assertion";
    pub const CONTENT_2020_12: &str = "https://json-schema.org/draft/2020-12/vocab/content";

    /// Experimental data-reference vocabulary
    pub const DATA: &str = "https://schemata.dev/vocab/data";

    pub const KNOWN: &[&str] = &[
        CORE_2019_09,
        APPLICATOR_2019_09,
        VALIDATION_2019_09,
        META_DATA_2019_09,
        FORMAT_2019_09,
        CONTENT_2019_09,
        CORE_2020_12,
        APPLICATOR_2020_12,
        UNEVALUATED_2020_12,
        VALIDATION_2020_12,
        META_DATA_2020_12,
        FORMAT_ANNOTATION_2020_12,
        FORMAT_ASSERTION_2020_12,
        CONTENT_2020_12,
        DATA,
    ];
}

/// Vocabularies declared by a meta-schema, in declaration order.
///
/// `true` marks a required vocabulary, `false` an optional one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VocabularySet {
    entries: Vec<(String, bool)>,
}

impl VocabularySet {
    pub fn new(entries: Vec<(String, bool)>) -> Self {
        Self { entries }
    }

    /// Whether the vocabulary is declared at all, required or optional
    pub fn contains(&self, uri: &str) -> bool {
        self.entries.iter().any(|(u, _)| u == uri)
    }

    pub fn is_required(&self, uri: &str) -> bool {
        self.entries.iter().any(|(u, required)| u == uri && *required)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(u, r)| (u.as_str(), *r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Required vocabularies this implementation does not understand
    pub fn unknown_required(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(uri, required)| *required && !uris::KNOWN.contains(&uri.as_str()))
            .map(|(uri, _)| uri.as_str())
            .collect()
    }

    /// Whether a keyword is active under this vocabulary set.
    ///
    /// Keywords without vocabulary membership and core keywords are always
    /// active.
    pub fn enables(&self, descriptor: &KeywordDescriptor) -> bool {
        let vocabularies = descriptor.vocabularies();
        vocabularies.is_empty()
            || vocabularies
                .iter()
                .any(|v| self.contains(v) || v == uris::CORE_2019_09 || v == uris::CORE_2020_12)
    }

    /// Whether the set declares a format-assertion vocabulary
    pub fn asserts_format(&self) -> bool {
        self.contains(uris::FORMAT_2019_09) || self.contains(uris::FORMAT_ASSERTION_2020_12)
    }
}

/// Parse `$vocabulary` from a meta-schema document.
///
/// Returns `None` when the meta-schema does not declare vocabularies.
pub fn required_vocabularies(meta_schema: &Value) -> Option<VocabularySet> {
    let declared = meta_schema.get("$vocabulary")?.as_object()?;
    let entries = declared
        .iter()
        .map(|(uri, required)| (uri.clone(), required.as_bool().unwrap_or(false)))
        .collect();
    Some(VocabularySet::new(entries))
}

/// Whether `format` should assert rather than only annotate
pub fn format_asserts(require_format_validation: bool, active: Option<&VocabularySet>) -> bool {
    require_format_validation || active.map(VocabularySet::asserts_format).unwrap_or(false)
}
