//! Parsed schema model
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! A [`JsonSchema`] owns a tree of [`SchemaNode`]s. Each node is either a
//! boolean literal or a list of keyword instances sorted by execution
//! priority. Reference keywords keep only their reference text; targets are
//! resolved lazily during evaluation.

mod parse;

pub use parse::ParseContext;

use crate::catalog::{KeywordCatalog, KeywordDescriptor};
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::evaluator;
use crate::keywords::Keyword;
use crate::options::ValidationOptions;
use crate::output::EvaluationResults;
use crate::pointer::JsonPointer;
use crate::registry::{uri_key, SchemaResource};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Host used for documents loaded without a base URI
const ANONYMOUS_HOST: &str = "https://schemata.local/";

/// A keyword present in a schema object, bound to its catalog entry
#[derive(Debug)]
pub struct KeywordInstance {
    name: String,
    descriptor: Arc<KeywordDescriptor>,
    raw: Value,
    keyword: Box<dyn Keyword>,
}

impl KeywordInstance {
    pub(crate) fn new(
        name: String,
        descriptor: Arc<KeywordDescriptor>,
        raw: Value,
        keyword: Box<dyn Keyword>,
    ) -> Self {
        Self {
            name,
            descriptor,
            raw,
            keyword,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &KeywordDescriptor {
        &self.descriptor
    }

    pub fn priority(&self) -> i64 {
        self.descriptor.priority()
    }

    /// The keyword's value as written in the schema
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub(crate) fn keyword(&self) -> &dyn Keyword {
        self.keyword.as_ref()
    }
}

/// Boolean literal or keyword list
#[derive(Debug)]
pub enum NodeKind {
    Boolean(bool),
    Keywords(Vec<KeywordInstance>),
}

/// One schema (or subschema) of a document
#[derive(Debug)]
pub struct SchemaNode {
    kind: NodeKind,
    base_uri: Url,
    pointer: JsonPointer,
    draft: Draft,
    meta_schema: Option<Arc<str>>,
    resource_root: bool,
}

impl SchemaNode {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            NodeKind::Boolean(b) => Some(b),
            NodeKind::Keywords(_) => None,
        }
    }

    /// Keyword instances in execution order
    pub fn keywords(&self) -> &[KeywordInstance] {
        match &self.kind {
            NodeKind::Boolean(_) => &[],
            NodeKind::Keywords(keywords) => keywords,
        }
    }

    pub fn keyword(&self, name: &str) -> Option<&KeywordInstance> {
        self.keywords().iter().find(|k| k.name() == name)
    }

    /// Base URI of the resource this node belongs to
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// Pointer from the resource root to this node
    pub fn pointer(&self) -> &JsonPointer {
        &self.pointer
    }

    /// Absolute schema location, `<base>#<pointer>`
    pub fn location(&self) -> String {
        format!("{}#{}", self.base_uri, self.pointer)
    }

    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// The `$schema` in effect for this node, if one was declared
    pub fn meta_schema(&self) -> Option<&str> {
        self.meta_schema.as_deref()
    }

    /// Whether this node starts a schema resource
    pub fn is_resource_root(&self) -> bool {
        self.resource_root
    }
}

/// Configurable schema construction
#[derive(Debug, Clone)]
pub struct SchemaParser {
    base_uri: Option<Url>,
    draft: Option<Draft>,
    default_draft: Draft,
    catalog: Arc<KeywordCatalog>,
}

impl Default for SchemaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaParser {
    pub fn new() -> Self {
        Self {
            base_uri: None,
            draft: None,
            default_draft: Draft::latest(),
            catalog: KeywordCatalog::standard(),
        }
    }

    /// Set the retrieval URI the document is resolved against
    pub fn with_base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    /// Force a draft, ignoring `$schema`
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    /// Draft used when a document has no `$schema`
    pub fn with_default_draft(mut self, draft: Draft) -> Self {
        self.default_draft = draft;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<KeywordCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn parse_str(&self, text: &str) -> Result<JsonSchema> {
        self.parse(serde_json::from_str(text)?)
    }

    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<JsonSchema> {
        self.parse(serde_json::from_reader(reader)?)
    }

    pub fn parse(&self, value: Value) -> Result<JsonSchema> {
        let anonymous = self.base_uri.is_none();
        let retrieval_uri = match &self.base_uri {
            Some(uri) => {
                let mut uri = uri.clone();
                uri.set_fragment(None);
                uri
            }
            None => anonymous_base()?,
        };
        let draft = self.draft.unwrap_or(self.default_draft);

        let mut ctx = ParseContext::new(&self.catalog, retrieval_uri.clone(), draft, self.draft.is_some());
        let root = ctx.parse_root(&value)?;

        let mut resources: HashMap<String, Arc<SchemaResource>> = HashMap::new();
        for resource in ctx.into_resources() {
            resources.insert(uri_key(resource.base_uri()), Arc::new(resource));
        }
        let retrieval_key = uri_key(&retrieval_uri);
        if !resources.contains_key(&retrieval_key) {
            if let Some(root_resource) = resources.get(&uri_key(root.base_uri())).cloned() {
                resources.insert(retrieval_key, root_resource);
            }
        }

        Ok(JsonSchema {
            root,
            resources: Arc::new(resources),
            raw: Arc::new(value),
            retrieval_uri,
            anonymous,
            catalog: self.catalog.clone(),
            forced_draft: self.draft,
            default_draft: self.default_draft,
        })
    }
}

fn anonymous_base() -> Result<Url> {
    let uri = format!("{}{}", ANONYMOUS_HOST, Uuid::new_v4());
    Url::parse(&uri).map_err(|e| Error::invalid_uri(uri, e))
}

/// A parsed schema document
#[derive(Debug, Clone)]
pub struct JsonSchema {
    root: Arc<SchemaNode>,
    resources: Arc<HashMap<String, Arc<SchemaResource>>>,
    raw: Arc<Value>,
    retrieval_uri: Url,
    anonymous: bool,
    catalog: Arc<KeywordCatalog>,
    forced_draft: Option<Draft>,
    default_draft: Draft,
}

impl JsonSchema {
    /// Parse a schema from JSON text
    pub fn from_text(text: &str) -> Result<Self> {
        SchemaParser::new().parse_str(text)
    }

    /// Parse a schema from a reader yielding JSON text
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        SchemaParser::new().parse_reader(reader)
    }

    /// Parse a schema from an already decoded JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        SchemaParser::new().parse(value)
    }

    pub fn parser() -> SchemaParser {
        SchemaParser::new()
    }

    pub fn root(&self) -> &Arc<SchemaNode> {
        &self.root
    }

    /// The root `$id`, when the document declares one
    pub fn id(&self) -> Option<&Url> {
        match self.raw.get("$id") {
            Some(Value::String(id)) if !id.starts_with('#') => Some(self.root.base_uri()),
            _ => None,
        }
    }

    /// URI the document was loaded from (or a generated one)
    pub fn base_uri(&self) -> &Url {
        &self.retrieval_uri
    }

    /// Whether the document was loaded without a base URI
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// The root `$schema` value
    pub fn meta_schema(&self) -> Option<&str> {
        self.root.meta_schema()
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    pub fn catalog(&self) -> &Arc<KeywordCatalog> {
        &self.catalog
    }

    /// Every resource declared by the document, keyed by base URI
    pub fn resources(&self) -> impl Iterator<Item = (&str, &Arc<SchemaResource>)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn resource(&self, key: &str) -> Option<&Arc<SchemaResource>> {
        self.resources.get(key)
    }

    /// Validate an instance against this schema
    pub fn validate(&self, instance: &Value, options: &ValidationOptions) -> Result<EvaluationResults> {
        evaluator::validate(self, instance, options)
    }

    /// Re-parse the document so it matches the catalog, draft and base URI
    /// requested by `options`. Returns `None` when the parsed form already does.
    pub(crate) fn prepared_for(&self, options: &ValidationOptions) -> Result<Option<JsonSchema>> {
        let rebase = self.anonymous && options.default_base_uri.is_some();
        let redraft = options.validate_as.is_some() && options.validate_as != self.forced_draft;
        let recatalog = !Arc::ptr_eq(&self.catalog, &options.catalog);
        if !(rebase || redraft || recatalog) {
            return Ok(None);
        }

        let mut parser = SchemaParser::new()
            .with_catalog(options.catalog.clone())
            .with_default_draft(self.default_draft);
        match (&options.default_base_uri, self.anonymous) {
            (Some(base), true) => parser = parser.with_base_uri(base.clone()),
            (_, false) => parser = parser.with_base_uri(self.retrieval_uri.clone()),
            (None, true) => {}
        }
        if let Some(draft) = options.validate_as.or(self.forced_draft) {
            parser = parser.with_draft(draft);
        }
        parser.parse((*self.raw).clone()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_text() {
        let schema = JsonSchema::from_text(r#"{"$id":"http://my.schema/test1","minimum":5}"#).unwrap();
        assert_eq!(schema.id().map(Url::as_str), Some("http://my.schema/test1"));
        assert_eq!(schema.root().keywords().len(), 2);
        assert_eq!(schema.root().keywords()[0].name(), "$id");
    }

    #[test]
    fn test_from_reader() {
        let text = br#"{"type": "string", "maxLength": 3}"#;
        let schema = JsonSchema::from_reader(&text[..]).unwrap();
        assert!(schema.is_anonymous());
        assert!(schema.id().is_none());
        assert!(schema.base_uri().as_str().starts_with(ANONYMOUS_HOST));
    }

    #[test]
    fn test_keywords_sorted_by_priority() {
        let schema = JsonSchema::from_value(json!({
            "unevaluatedProperties": false,
            "additionalProperties": true,
            "properties": {},
            "$schema": "https://json-schema.org/draft/2020-12/schema"
        }))
        .unwrap();
        let names: Vec<&str> = schema.root().keywords().iter().map(KeywordInstance::name).collect();
        assert_eq!(
            names,
            vec!["$schema", "properties", "additionalProperties", "unevaluatedProperties"]
        );
    }

    #[test]
    fn test_boolean_root() {
        let schema = JsonSchema::from_value(json!(false)).unwrap();
        assert_eq!(schema.root().as_bool(), Some(false));
        assert!(schema.root().is_resource_root());
        assert_eq!(schema.resources().count(), 1);
    }

    #[test]
    fn test_malformed_keyword_value() {
        let err = JsonSchema::from_value(json!({"maxItems": "three"})).unwrap_err();
        assert!(matches!(err, Error::SchemaParse { .. }));
        assert!(JsonSchema::from_text("{").is_err());
    }

    #[test]
    fn test_retrieval_alias() {
        let schema = SchemaParser::new()
            .with_base_uri(Url::parse("file:///schemas/person.json").unwrap())
            .parse(json!({"$id": "https://example.com/person"}))
            .unwrap();
        let keys: Vec<&str> = schema.resources().map(|(k, _)| k).collect();
        assert!(keys.contains(&"https://example.com/person"));
        assert!(keys.contains(&"file:///schemas/person.json"));
    }
}
