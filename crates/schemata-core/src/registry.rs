//! Schema resources and the shared registry
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::meta;
use crate::pointer::JsonPointer;
use crate::schema::{JsonSchema, SchemaNode, SchemaParser};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Registry key for a URI: the URI without its fragment
pub(crate) fn uri_key(uri: &Url) -> String {
    let mut uri = uri.clone();
    uri.set_fragment(None);
    uri.into()
}

/// A schema resource: a subtree identified by a base URI.
///
/// Holds every subschema reachable from the resource root by JSON pointer
/// and the anchors the resource declares.
pub struct SchemaResource {
    pub(crate) base: Url,
    pub(crate) raw: Arc<Value>,
    pub(crate) root: Arc<SchemaNode>,
    pub(crate) pointers: HashMap<String, Arc<SchemaNode>>,
    pub(crate) anchors: HashMap<String, Arc<SchemaNode>>,
    pub(crate) dynamic_anchors: HashMap<String, Arc<SchemaNode>>,
    pub(crate) recursive_anchor: bool,
    pub(crate) draft: Draft,
    pub(crate) meta_schema: Option<Arc<str>>,
}

impl SchemaResource {
    pub fn base_uri(&self) -> &Url {
        &self.base
    }

    pub fn root(&self) -> &Arc<SchemaNode> {
        &self.root
    }

    /// The resource's JSON as written
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn draft(&self) -> Draft {
        self.draft
    }

    pub fn meta_schema(&self) -> Option<&str> {
        self.meta_schema.as_deref()
    }

    /// Subschema indexed at `pointer`
    pub fn node_at(&self, pointer: &JsonPointer) -> Option<&Arc<SchemaNode>> {
        self.pointers.get(&pointer.to_string())
    }

    /// Subschema declared with `$anchor`, `$dynamicAnchor` or a legacy `$id`
    pub fn anchor(&self, name: &str) -> Option<&Arc<SchemaNode>> {
        self.anchors.get(name)
    }

    pub fn dynamic_anchor(&self, name: &str) -> Option<&Arc<SchemaNode>> {
        self.dynamic_anchors.get(name)
    }

    pub fn declares_dynamic_anchor(&self, name: &str) -> bool {
        self.dynamic_anchors.contains_key(name)
    }

    /// Whether the root carries `$recursiveAnchor: true`
    pub fn has_recursive_anchor(&self) -> bool {
        self.recursive_anchor
    }
}

impl fmt::Debug for SchemaResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut anchors: Vec<&String> = self.anchors.keys().collect();
        anchors.sort();
        f.debug_struct("SchemaResource")
            .field("base", &self.base.as_str())
            .field("draft", &self.draft)
            .field("pointers", &self.pointers.len())
            .field("anchors", &anchors)
            .field("recursive_anchor", &self.recursive_anchor)
            .finish()
    }
}

/// Supplies documents that are not registered up front.
///
/// The resolver calls this at most once per URI within a validation call.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(&self, uri: &Url) -> Result<Value>;
}

impl<F> DocumentFetcher for F
where
    F: Fn(&Url) -> Result<Value> + Send + Sync,
{
    fn fetch(&self, uri: &Url) -> Result<Value> {
        self(uri)
    }
}

/// Maps base URIs to parsed schema resources.
///
/// Built by explicit registration and then shared read-only through an
/// `Arc` in [`crate::ValidationOptions`].
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    resources: HashMap<String, Arc<SchemaResource>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the official meta-schemas of every supported draft
    pub fn with_meta_schemas() -> Self {
        let mut registry = Self::new();
        for schema in meta::documents() {
            for (key, resource) in schema.resources() {
                registry.resources.insert(key.to_string(), resource.clone());
            }
        }
        registry
    }

    /// Register every resource of a parsed document.
    ///
    /// Registering the same resource twice is a no-op; a different resource
    /// under an existing URI is a configuration error.
    pub fn register(&mut self, schema: &JsonSchema) -> Result<()> {
        let mut incoming = Vec::new();
        for (key, resource) in schema.resources() {
            if let Some(existing) = self.resources.get(key) {
                if !Arc::ptr_eq(existing, resource) {
                    return Err(Error::configuration(format!(
                        "A different schema is already registered as '{}'",
                        key
                    )));
                }
                continue;
            }
            incoming.push((key.to_string(), resource.clone()));
        }
        for (key, resource) in incoming {
            debug!(uri = %key, "Registered schema resource");
            self.resources.insert(key, resource);
        }
        Ok(())
    }

    /// Parse `document` with `uri` as its retrieval URI and register it
    pub fn register_document(&mut self, uri: &str, document: Value) -> Result<JsonSchema> {
        let base = Url::parse(uri).map_err(|e| Error::invalid_uri(uri, e))?;
        let schema = SchemaParser::new().with_base_uri(base).parse(document)?;
        self.register(&schema)?;
        Ok(schema)
    }

    pub fn get(&self, uri: &Url) -> Option<&Arc<SchemaResource>> {
        self.resources.get(&uri_key(uri))
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.resources.contains_key(&uri_key(uri))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
