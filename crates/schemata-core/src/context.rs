//! Per-call evaluation state
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! An [`EvaluationContext`] lives for one validation call. It tracks the
//! instance and evaluation cursors, the dynamic scope, the active draft and
//! vocabularies, and the stack of results under construction. Keywords use it
//! to record failures and annotations and to evaluate subschemas.

use crate::catalog::KeywordDescriptor;
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::evaluator;
use crate::messages;
use crate::meta;
use crate::options::ValidationOptions;
use crate::pointer::JsonPointer;
use crate::registry::{uri_key, SchemaResource};
use crate::resolver::{self, ReferenceKind};
use crate::result::{merge_annotation, LocalResult};
use crate::schema::{JsonSchema, KeywordInstance, ParseContext, SchemaNode, SchemaParser};
use crate::vocabulary::{self, VocabularySet};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// Receives a line for every evaluated keyword
pub trait TraceSink: Send + Sync {
    fn trace(&self, message: &str);
}

impl<F> TraceSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn trace(&self, message: &str) {
        self(message)
    }
}

/// A schema resource entered during evaluation
#[derive(Debug, Clone)]
pub struct DynamicScopeFrame {
    base_uri: Url,
    resource: Arc<SchemaResource>,
}

impl DynamicScopeFrame {
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    pub fn resource(&self) -> &Arc<SchemaResource> {
        &self.resource
    }
}

/// State restored when a node finishes
pub(crate) struct NodeScope {
    draft: Draft,
    vocabularies: Option<Arc<VocabularySet>>,
    pushed_frame: bool,
}

struct Frame {
    result: LocalResult,
    forwarded: BTreeMap<String, Value>,
}

impl Frame {
    fn new(result: LocalResult) -> Self {
        Self {
            result,
            forwarded: BTreeMap::new(),
        }
    }
}

pub struct EvaluationContext<'a> {
    options: &'a ValidationOptions,
    document: &'a JsonSchema,
    root_instance: &'a Value,
    instance: &'a Value,
    instance_location: JsonPointer,
    evaluation_path: JsonPointer,
    dynamic_scope: Vec<DynamicScopeFrame>,
    draft: Draft,
    vocabularies: Option<Arc<VocabularySet>>,
    vocabulary_cache: HashMap<String, Option<Arc<VocabularySet>>>,
    depth: usize,
    frames: Vec<Frame>,
    cache: HashMap<String, Arc<SchemaResource>>,
    on_demand: HashMap<String, Arc<SchemaNode>>,
    failed_fetches: HashSet<String>,
    data_documents: HashMap<String, Option<Arc<Value>>>,
    wants_annotations: bool,
}

impl<'a> EvaluationContext<'a> {
    pub(crate) fn new(document: &'a JsonSchema, instance: &'a Value, options: &'a ValidationOptions) -> Self {
        Self {
            options,
            document,
            root_instance: instance,
            instance,
            instance_location: JsonPointer::root(),
            evaluation_path: JsonPointer::root(),
            dynamic_scope: Vec::new(),
            draft: document.root().draft(),
            vocabularies: None,
            vocabulary_cache: HashMap::new(),
            depth: 0,
            frames: Vec::new(),
            cache: HashMap::new(),
            on_demand: HashMap::new(),
            failed_fetches: HashSet::new(),
            data_documents: HashMap::new(),
            wants_annotations: false,
        }
    }

    /// The value under evaluation
    pub fn instance(&self) -> &'a Value {
        self.instance
    }

    /// The whole instance document
    pub fn root_instance(&self) -> &'a Value {
        self.root_instance
    }

    pub fn instance_location(&self) -> &JsonPointer {
        &self.instance_location
    }

    pub fn evaluation_path(&self) -> &JsonPointer {
        &self.evaluation_path
    }

    /// Draft of the schema resource being evaluated
    pub fn draft(&self) -> Draft {
        self.draft
    }

    pub fn options(&self) -> &'a ValidationOptions {
        self.options
    }

    /// Vocabularies declared by the active meta-schema, if it declares any
    pub fn vocabularies(&self) -> Option<&VocabularySet> {
        self.vocabularies.as_deref()
    }

    /// Entered schema resources, outermost first
    pub fn dynamic_scope(&self) -> &[DynamicScopeFrame] {
        &self.dynamic_scope
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Base URI of the innermost entered resource
    pub fn current_base(&self) -> &Url {
        self.dynamic_scope
            .last()
            .map(|frame| &frame.base_uri)
            .unwrap_or_else(|| self.document.base_uri())
    }

    /// Whether an `unevaluated*` keyword of the current node, or of a node
    /// this one is applied in place of, reads the annotations being produced
    pub fn annotations_needed(&self) -> bool {
        self.wants_annotations
    }

    /// Set whether annotations are needed, returning the previous setting
    pub(crate) fn set_annotations_needed(&mut self, needed: bool) -> bool {
        std::mem::replace(&mut self.wants_annotations, needed)
    }

    /// Whether `format` asserts for the node being evaluated
    pub fn format_asserts(&self) -> bool {
        vocabulary::format_asserts(self.options.require_format_validation, self.vocabularies())
    }

    pub(crate) fn keyword_enabled(&self, descriptor: &KeywordDescriptor) -> bool {
        self.vocabularies
            .as_ref()
            .map(|set| set.enables(descriptor))
            .unwrap_or(true)
    }

    /// Render a message template, honouring overrides from the options
    pub fn message(&self, key: &str, tokens: &[(&str, String)]) -> String {
        messages::format_message(&self.options.messages, key, tokens)
    }

    /// Record a failure on the current result
    pub fn fail(&mut self, message: impl Into<String>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.result.valid = false;
            frame.result.errors.push(message.into());
        }
    }

    /// Mark the current result invalid; the cause is carried by its children
    pub fn invalidate(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.result.valid = false;
        }
    }

    /// Attach the current keyword's annotation
    pub fn annotate(&mut self, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            if let Some(name) = frame.result.keyword.clone() {
                merge_annotation(&mut frame.result.annotations, &name, value);
            }
        }
    }

    fn node_frame(&self) -> Option<&Frame> {
        self.frames.iter().rev().find(|frame| frame.result.keyword.is_none())
    }

    /// Annotation produced by an already evaluated sibling keyword, valid or not
    pub fn sibling_annotation(&self, keyword: &str) -> Option<&Value> {
        self.node_frame()?
            .result
            .children
            .iter()
            .find(|child| child.keyword.as_deref() == Some(keyword))
            .and_then(|child| child.annotations.get(keyword))
    }

    /// Annotation accumulated on the current node, including annotations
    /// forwarded from in-place subschemas
    pub fn node_annotation(&self, name: &str) -> Option<&Value> {
        self.node_frame()?.result.annotations.get(name)
    }

    pub(crate) fn begin_node(&mut self, node: &SchemaNode) {
        self.frames.push(Frame::new(LocalResult::new(
            None,
            self.instance_location.to_string(),
            self.evaluation_path.to_string(),
            node.location(),
        )));
    }

    pub(crate) fn end_node(&mut self) -> LocalResult {
        let mut result = match self.frames.pop() {
            Some(frame) => frame.result,
            None => LocalResult::new(
                None,
                self.instance_location.to_string(),
                self.evaluation_path.to_string(),
                String::new(),
            ),
        };
        result.valid = result.valid && result.errors.is_empty() && result.children.iter().all(|c| c.valid);
        if !result.valid {
            result.strip_annotations();
        }
        result
    }

    pub(crate) fn enter_keyword(&mut self, node: &SchemaNode, keyword: &KeywordInstance) {
        self.evaluation_path.push(keyword.name());
        let schema_location = format!("{}#{}", node.base_uri(), node.pointer().join(keyword.name()));
        self.frames.push(Frame::new(LocalResult::new(
            Some(keyword.name().to_string()),
            self.instance_location.to_string(),
            self.evaluation_path.to_string(),
            schema_location,
        )));
    }

    /// Record `keyword` as skipped after an earlier failure
    pub(crate) fn skip_keyword(&mut self, node: &SchemaNode, keyword: &KeywordInstance) {
        let mut evaluation_path = self.evaluation_path.clone();
        evaluation_path.push(keyword.name());
        let mut result = LocalResult::new(
            Some(keyword.name().to_string()),
            self.instance_location.to_string(),
            evaluation_path.to_string(),
            format!("{}#{}", node.base_uri(), node.pointer().join(keyword.name())),
        );
        result.skipped = true;
        if let Some(frame) = self.frames.last_mut() {
            frame.result.children.push(result);
        }
    }

    /// Close the current keyword result and fold it into its node.
    ///
    /// Returns whether the keyword passed.
    pub(crate) fn exit_keyword(&mut self, annotation_only: bool) -> bool {
        self.evaluation_path.pop();
        let Some(Frame { mut result, forwarded }) = self.frames.pop() else {
            return true;
        };
        if annotation_only {
            result.valid = true;
            result.errors.clear();
        }
        let valid = result.valid;
        if let Some(node) = self.frames.last_mut() {
            if valid {
                if let Some(name) = &result.keyword {
                    if let Some(value) = result.annotations.get(name) {
                        merge_annotation(&mut node.result.annotations, name, value.clone());
                    }
                }
                for (name, value) in forwarded {
                    merge_annotation(&mut node.result.annotations, &name, value);
                }
            }
            node.result.children.push(result);
        }
        valid
    }

    /// Enter a node: depth check, dynamic scope and active draft
    pub(crate) fn enter_scope(&mut self, node: &SchemaNode) -> Result<NodeScope> {
        if self.depth >= self.options.max_traversal_depth {
            debug!(
                limit = self.options.max_traversal_depth,
                location = %node.location(),
                "Traversal limit exceeded"
            );
            return Err(Error::traversal_limit(self.options.max_traversal_depth, node.location()));
        }
        self.depth += 1;

        let enters_resource = self
            .dynamic_scope
            .last()
            .map(|frame| &frame.base_uri != node.base_uri())
            .unwrap_or(true);
        let mut pushed_frame = false;
        if enters_resource {
            if let Some(resource) = self.known_resource(node.base_uri()) {
                self.dynamic_scope.push(DynamicScopeFrame {
                    base_uri: node.base_uri().clone(),
                    resource,
                });
                pushed_frame = true;
            }
        }

        let scope = NodeScope {
            draft: self.draft,
            vocabularies: self.vocabularies.clone(),
            pushed_frame,
        };
        self.draft = node.draft();
        self.vocabularies = match node.meta_schema() {
            Some(uri) => self.vocabularies_for(uri),
            None => None,
        };
        Ok(scope)
    }

    pub(crate) fn exit_scope(&mut self, scope: NodeScope) {
        self.depth = self.depth.saturating_sub(1);
        if scope.pushed_frame {
            self.dynamic_scope.pop();
        }
        self.draft = scope.draft;
        self.vocabularies = scope.vocabularies;
    }

    fn vocabularies_for(&mut self, meta_schema: &str) -> Option<Arc<VocabularySet>> {
        if let Some(cached) = self.vocabulary_cache.get(meta_schema) {
            return cached.clone();
        }
        let set = Url::parse(meta_schema)
            .ok()
            .and_then(|uri| self.known_resource(&uri))
            .and_then(|resource| vocabulary::required_vocabularies(resource.raw()))
            .map(Arc::new);
        self.vocabulary_cache.insert(meta_schema.to_string(), set.clone());
        set
    }

    /// Evaluate `node` against the current instance and attach the result to
    /// the current keyword. With `forward`, a passing subschema hands its
    /// dependency annotations up to the enclosing node.
    pub fn evaluate_in_place(&mut self, node: &Arc<SchemaNode>, path: &[&str], forward: bool) -> Result<bool> {
        for segment in path {
            self.evaluation_path.push(*segment);
        }
        let outcome = evaluator::evaluate_node(self, node);
        for _ in path {
            self.evaluation_path.pop();
        }
        Ok(self.attach(outcome?, forward))
    }

    /// Evaluate `node` against the property `name` of the current object
    pub fn evaluate_property(&mut self, name: &str, node: &Arc<SchemaNode>, path: &[&str]) -> Result<bool> {
        let Some(child) = self.instance.as_object().and_then(|map| map.get(name)) else {
            return Ok(true);
        };
        self.evaluate_at(name.to_string(), child, node, path)
    }

    /// Evaluate `node` against the item at `index` of the current array
    pub fn evaluate_item(&mut self, index: usize, node: &Arc<SchemaNode>, path: &[&str]) -> Result<bool> {
        let Some(child) = self.instance.as_array().and_then(|items| items.get(index)) else {
            return Ok(true);
        };
        self.evaluate_at(index.to_string(), child, node, path)
    }

    fn evaluate_at(&mut self, token: String, child: &'a Value, node: &Arc<SchemaNode>, path: &[&str]) -> Result<bool> {
        let saved = self.instance;
        let needed = self.set_annotations_needed(false);
        self.instance = child;
        self.instance_location.push(token);
        for segment in path {
            self.evaluation_path.push(*segment);
        }
        let outcome = evaluator::evaluate_node(self, node);
        for _ in path {
            self.evaluation_path.pop();
        }
        self.instance_location.pop();
        self.instance = saved;
        self.set_annotations_needed(needed);
        Ok(self.attach(outcome?, false))
    }

    /// Evaluate `node` against a value that is not part of the instance
    /// document, such as a property name. `token` names the value's location
    /// below the current instance.
    pub fn evaluate_detached(
        &mut self,
        instance: &Value,
        token: &str,
        node: &Arc<SchemaNode>,
        path: &[&str],
    ) -> Result<bool> {
        let mut evaluation_path = self.evaluation_path.clone();
        for segment in path {
            evaluation_path.push(*segment);
        }
        let mut child = EvaluationContext {
            options: self.options,
            document: self.document,
            root_instance: self.root_instance,
            instance,
            instance_location: self.instance_location.join(token),
            evaluation_path,
            dynamic_scope: std::mem::take(&mut self.dynamic_scope),
            draft: self.draft,
            vocabularies: self.vocabularies.clone(),
            vocabulary_cache: std::mem::take(&mut self.vocabulary_cache),
            depth: self.depth,
            frames: Vec::new(),
            cache: std::mem::take(&mut self.cache),
            on_demand: std::mem::take(&mut self.on_demand),
            failed_fetches: std::mem::take(&mut self.failed_fetches),
            data_documents: std::mem::take(&mut self.data_documents),
            wants_annotations: false,
        };
        let outcome = evaluator::evaluate_node(&mut child, node);

        self.dynamic_scope = child.dynamic_scope;
        self.vocabulary_cache = child.vocabulary_cache;
        self.cache = child.cache;
        self.on_demand = child.on_demand;
        self.failed_fetches = child.failed_fetches;
        self.data_documents = child.data_documents;

        Ok(self.attach(outcome?, false))
    }

    fn attach(&mut self, result: LocalResult, forward: bool) -> bool {
        let valid = result.valid;
        let options = self.options;
        if let Some(frame) = self.frames.last_mut() {
            if forward && valid {
                for (name, value) in &result.annotations {
                    let dependent = options
                        .catalog
                        .get(name)
                        .map(|descriptor| descriptor.produces_dependent_annotations())
                        .unwrap_or(false);
                    if dependent {
                        merge_annotation(&mut frame.forwarded, name, value.clone());
                    }
                }
            }
            frame.result.children.push(result);
        }
        valid
    }

    /// Resolve a reference target with static or dynamic scoping
    pub fn resolve_reference(&mut self, kind: ReferenceKind, target: &Url) -> Result<Arc<SchemaNode>> {
        resolver::resolve(self, kind, target)
    }

    /// A resource already known to this call, without fetching
    pub(crate) fn known_resource(&self, uri: &Url) -> Option<Arc<SchemaResource>> {
        let key = uri_key(uri);
        self.document
            .resource(&key)
            .or_else(|| self.cache.get(&key))
            .cloned()
            .or_else(|| self.options.schema_registry.get(uri).cloned())
            .or_else(|| meta::lookup(uri))
    }

    /// Locate the resource for `uri`, fetching it when nothing else has it
    pub(crate) fn locate_resource(&mut self, uri: &Url) -> Result<Arc<SchemaResource>> {
        match self.known_resource(uri) {
            Some(resource) => Ok(resource),
            None => self.fetch_resource(uri),
        }
    }

    fn fetch_resource(&mut self, uri: &Url) -> Result<Arc<SchemaResource>> {
        let key = uri_key(uri);
        let Some(fetcher) = self.options.fetcher.clone() else {
            return Err(Error::unresolved(
                uri.as_str(),
                self.current_base().as_str(),
                "no schema is registered under this URI",
            ));
        };
        if self.failed_fetches.contains(&key) {
            return Err(Error::unresolved(
                uri.as_str(),
                self.current_base().as_str(),
                "the document could not be fetched",
            ));
        }

        let mut base = uri.clone();
        base.set_fragment(None);
        debug!(uri = %base, "Fetching external schema");
        let fetched = fetcher.fetch(&base).and_then(|document| {
            SchemaParser::new()
                .with_base_uri(base.clone())
                .with_default_draft(self.draft)
                .with_catalog(self.options.catalog.clone())
                .parse(document)
        });
        let schema = match fetched {
            Ok(schema) => schema,
            Err(e) => {
                self.failed_fetches.insert(key);
                return Err(Error::fetch(base.as_str(), e.to_string()));
            }
        };
        for (resource_key, resource) in schema.resources() {
            self.cache
                .entry(resource_key.to_string())
                .or_insert_with(|| resource.clone());
        }
        self.cache.get(&key).cloned().ok_or_else(|| {
            Error::unresolved(
                uri.as_str(),
                self.current_base().as_str(),
                "the fetched document does not declare this resource",
            )
        })
    }

    /// Load a document referenced by the `data` keyword. Each document is
    /// requested from the data fetcher at most once per call.
    pub(crate) fn locate_data_document(&mut self, uri: &Url) -> Option<Arc<Value>> {
        let mut document_uri = uri.clone();
        document_uri.set_fragment(None);
        let key = document_uri.to_string();
        if let Some(cached) = self.data_documents.get(&key) {
            return cached.clone();
        }
        let fetcher = self.options.data_fetcher.clone()?;
        debug!(uri = %document_uri, "Fetching data document");
        let document = fetcher.fetch(&document_uri).map(Arc::new);
        if document.is_none() {
            debug!(uri = %document_uri, "Data document could not be fetched");
        }
        self.data_documents.insert(key, document.clone());
        document
    }

    /// Parse the subschema at `pointer` inside `resource` when the pointer
    /// index does not hold it. Returns `None` when the pointer does not
    /// resolve.
    pub(crate) fn parse_on_demand(
        &mut self,
        resource: &SchemaResource,
        pointer: &JsonPointer,
    ) -> Result<Option<Arc<SchemaNode>>> {
        let key = format!("{}#{}", resource.base_uri(), pointer);
        if let Some(node) = self.on_demand.get(&key) {
            return Ok(Some(node.clone()));
        }
        let Some(value) = pointer.evaluate(resource.raw()) else {
            return Ok(None);
        };
        trace!(location = %key, "Parsing subschema on demand");
        let mut parse = ParseContext::within(&self.options.catalog, resource, pointer);
        let node = parse.parse_detached(value)?;
        for embedded in parse.into_resources() {
            self.cache
                .entry(uri_key(embedded.base_uri()))
                .or_insert_with(|| Arc::new(embedded));
        }
        self.on_demand.insert(key, node.clone());
        Ok(Some(node))
    }

    /// Mirror a line to the configured trace sink
    pub(crate) fn trace(&self, message: impl FnOnce() -> String) {
        if let Some(sink) = &self.options.log {
            sink.trace(&message());
        }
    }
}
