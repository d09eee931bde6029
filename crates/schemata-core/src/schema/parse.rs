//! Schema parsing and resource indexing
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use super::{KeywordInstance, NodeKind, SchemaNode};
use crate::catalog::KeywordCatalog;
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::instance::kind_of;
use crate::pointer::JsonPointer;
use crate::registry::SchemaResource;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// A schema resource whose root is still being parsed
#[derive(Debug)]
struct ResourceBuilder {
    base: Url,
    raw: Arc<Value>,
    offset: JsonPointer,
    draft: Draft,
    meta_schema: Option<Arc<str>>,
    pointers: HashMap<String, Arc<SchemaNode>>,
    anchors: HashMap<String, Arc<SchemaNode>>,
    dynamic_anchors: HashMap<String, Arc<SchemaNode>>,
    recursive_anchor: bool,
    scratch: bool,
}

impl ResourceBuilder {
    fn new(base: Url, raw: Value, draft: Draft, meta_schema: Option<Arc<str>>) -> Self {
        Self {
            base,
            raw: Arc::new(raw),
            offset: JsonPointer::root(),
            draft,
            meta_schema,
            pointers: HashMap::new(),
            anchors: HashMap::new(),
            dynamic_anchors: HashMap::new(),
            recursive_anchor: false,
            scratch: false,
        }
    }

    fn finish(self, root: Arc<SchemaNode>) -> SchemaResource {
        SchemaResource {
            base: self.base,
            raw: self.raw,
            root,
            pointers: self.pointers,
            anchors: self.anchors,
            dynamic_anchors: self.dynamic_anchors,
            recursive_anchor: self.recursive_anchor,
            draft: self.draft,
            meta_schema: self.meta_schema,
        }
    }
}

enum Identity {
    Anchor(String),
    Resource(Url, Option<String>),
    Nothing,
}

/// State threaded through keyword parsers while a document is parsed.
///
/// Every parsed subschema is indexed by its JSON pointer in each enclosing
/// resource, so references can reach it through any of them.
pub struct ParseContext<'c> {
    catalog: &'c KeywordCatalog,
    forced_draft: Option<Draft>,
    draft: Draft,
    meta_schema: Option<Arc<str>>,
    base: Url,
    open: Vec<ResourceBuilder>,
    finished: Vec<SchemaResource>,
}

impl<'c> ParseContext<'c> {
    pub(crate) fn new(
        catalog: &'c KeywordCatalog,
        base: Url,
        draft: Draft,
        forced: bool,
    ) -> Self {
        Self {
            catalog,
            forced_draft: forced.then_some(draft),
            draft,
            meta_schema: None,
            base,
            open: Vec::new(),
            finished: Vec::new(),
        }
    }

    /// A context positioned at `pointer` inside an already indexed resource
    pub(crate) fn within(
        catalog: &'c KeywordCatalog,
        resource: &SchemaResource,
        pointer: &JsonPointer,
    ) -> Self {
        let mut scratch = ResourceBuilder::new(
            resource.base.clone(),
            Value::Null,
            resource.draft,
            resource.meta_schema.clone(),
        );
        scratch.offset = pointer.clone();
        scratch.scratch = true;
        Self {
            catalog,
            forced_draft: None,
            draft: resource.draft,
            meta_schema: resource.meta_schema.clone(),
            base: resource.base.clone(),
            open: vec![scratch],
            finished: Vec::new(),
        }
    }

    /// Parse a whole document
    pub(crate) fn parse_root(&mut self, value: &Value) -> Result<Arc<SchemaNode>> {
        self.parse_node(value)
    }

    /// Parse a value positioned by a [`ParseContext::within`] context
    pub(crate) fn parse_detached(&mut self, value: &Value) -> Result<Arc<SchemaNode>> {
        self.parse_node(value)
    }

    pub(crate) fn into_resources(self) -> Vec<SchemaResource> {
        self.finished
    }

    /// The draft in effect at the current position
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// The base URI in effect at the current position
    pub fn base_uri(&self) -> &Url {
        &self.base
    }

    pub fn catalog(&self) -> &KeywordCatalog {
        self.catalog
    }

    fn current_pointer(&self) -> JsonPointer {
        self.open
            .last()
            .map(|builder| builder.offset.clone())
            .unwrap_or_default()
    }

    /// Absolute location of the current position
    pub fn location(&self) -> String {
        format!("{}#{}", self.base, self.current_pointer())
    }

    /// A parse error at the current position
    pub fn error(&self, reason: impl Into<String>) -> Error {
        Error::schema_parse(self.location(), reason)
    }

    /// Compile a regular expression, reporting failures at the current position
    pub fn compile_regex(&self, pattern: &str) -> Result<Regex> {
        Regex::new(pattern)
            .map_err(|e| self.error(format!("Invalid regular expression '{}': {}", pattern, e)))
    }

    /// Parse a subschema found below the current keyword at `segments`
    pub fn subschema(&mut self, value: &Value, segments: &[&str]) -> Result<Arc<SchemaNode>> {
        for segment in segments {
            self.push_segment(segment);
        }
        let parsed = self.parse_node(value);
        for _ in segments {
            self.pop_segment();
        }
        parsed
    }

    fn push_segment(&mut self, segment: &str) {
        for builder in &mut self.open {
            builder.offset.push(segment);
        }
    }

    fn pop_segment(&mut self) {
        for builder in &mut self.open {
            builder.offset.pop();
        }
    }

    fn parse_node(&mut self, value: &Value) -> Result<Arc<SchemaNode>> {
        match value {
            Value::Bool(b) => {
                let opens = self.open.is_empty();
                if opens {
                    self.open_resource(value);
                }
                let node = Arc::new(SchemaNode {
                    kind: NodeKind::Boolean(*b),
                    base_uri: self.base.clone(),
                    pointer: self.current_pointer(),
                    draft: self.draft,
                    meta_schema: self.meta_schema.clone(),
                    resource_root: opens,
                });
                self.index(&node);
                if opens {
                    self.close_resource(&node);
                }
                Ok(node)
            }
            Value::Object(map) => self.parse_object(value, map),
            other => Err(self.error(format!(
                "Expected a schema (object or boolean), found {}",
                kind_of(other)
            ))),
        }
    }

    fn parse_object(&mut self, value: &Value, map: &Map<String, Value>) -> Result<Arc<SchemaNode>> {
        let saved_draft = self.draft;
        let saved_meta = self.meta_schema.clone();
        let saved_base = self.base.clone();

        let parsed = self.parse_object_inner(value, map);

        self.draft = saved_draft;
        self.meta_schema = saved_meta;
        self.base = saved_base;
        parsed
    }

    fn parse_object_inner(&mut self, value: &Value, map: &Map<String, Value>) -> Result<Arc<SchemaNode>> {
        if let Some(Value::String(uri)) = map.get("$schema") {
            if self.forced_draft.is_none() {
                if let Some(draft) = Draft::from_meta_schema_uri(uri) {
                    self.draft = draft;
                }
            }
            self.meta_schema = Some(Arc::from(uri.as_str()));
        }

        let ref_hides_siblings = self.draft.ref_overrides_siblings() && map.contains_key("$ref");
        let mut legacy_anchor = None;
        let mut opens = self.open.is_empty();
        if !ref_hides_siblings {
            if let Some(Value::String(id)) = map.get("$id") {
                match self.identify(id)? {
                    Identity::Anchor(name) => legacy_anchor = Some(name),
                    Identity::Resource(base, anchor) => {
                        if self.open.is_empty() || base != self.base {
                            opens = true;
                        }
                        self.base = base;
                        legacy_anchor = anchor;
                    }
                    Identity::Nothing => {}
                }
            }
        }
        if opens {
            self.open_resource(value);
        }

        let mut keywords = Vec::with_capacity(map.len());
        for (name, raw) in map {
            let descriptor = self.catalog.get_or_unrecognized(name).clone();
            self.push_segment(name);
            let parsed = (descriptor.parser())(raw, map, self);
            self.pop_segment();
            keywords.push(KeywordInstance::new(name.clone(), descriptor, raw.clone(), parsed?));
        }
        keywords.sort_by_key(KeywordInstance::priority);

        let node = Arc::new(SchemaNode {
            kind: NodeKind::Keywords(keywords),
            base_uri: self.base.clone(),
            pointer: self.current_pointer(),
            draft: self.draft,
            meta_schema: self.meta_schema.clone(),
            resource_root: opens,
        });
        self.index(&node);
        self.register_anchors(&node, map, legacy_anchor, opens);

        if opens {
            self.close_resource(&node);
        }
        Ok(node)
    }

    fn identify(&self, id: &str) -> Result<Identity> {
        if self.draft.id_declares_anchor() {
            if let Some(name) = id.strip_prefix('#') {
                return Ok(if name.is_empty() {
                    Identity::Nothing
                } else {
                    Identity::Anchor(name.to_string())
                });
            }
        }
        let mut joined = self.base.join(id).map_err(|e| Error::invalid_uri(id, e))?;
        let fragment = joined
            .fragment()
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        joined.set_fragment(None);
        let anchor = if self.draft.id_declares_anchor() { fragment } else { None };
        Ok(Identity::Resource(joined, anchor))
    }

    fn register_anchors(
        &mut self,
        node: &Arc<SchemaNode>,
        map: &Map<String, Value>,
        legacy_anchor: Option<String>,
        resource_root: bool,
    ) {
        let draft = self.draft;
        let Some(builder) = self.open.last_mut() else {
            return;
        };
        if let Some(name) = legacy_anchor {
            builder.anchors.insert(name, node.clone());
        }
        if draft >= Draft::Draft201909 {
            if let Some(Value::String(name)) = map.get("$anchor") {
                builder.anchors.insert(name.clone(), node.clone());
            }
        }
        if draft == Draft::Draft202012 {
            if let Some(Value::String(name)) = map.get("$dynamicAnchor") {
                builder.anchors.insert(name.clone(), node.clone());
                builder.dynamic_anchors.insert(name.clone(), node.clone());
            }
        }
        if draft == Draft::Draft201909 && resource_root {
            if let Some(Value::Bool(true)) = map.get("$recursiveAnchor") {
                builder.recursive_anchor = true;
            }
        }
    }

    fn open_resource(&mut self, value: &Value) {
        self.open.push(ResourceBuilder::new(
            self.base.clone(),
            value.clone(),
            self.draft,
            self.meta_schema.clone(),
        ));
    }

    fn close_resource(&mut self, root: &Arc<SchemaNode>) {
        if let Some(builder) = self.open.pop() {
            if !builder.scratch {
                self.finished.push(builder.finish(root.clone()));
            }
        }
    }

    fn index(&mut self, node: &Arc<SchemaNode>) {
        for builder in &mut self.open {
            builder.pointers.insert(builder.offset.to_string(), node.clone());
        }
    }
}
