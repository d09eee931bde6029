//! Keyword catalog and execution priority resolution
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! A [`KeywordCatalog`] is an explicit table of keyword kinds. Every entry
//! carries the drafts it supports, the vocabularies it belongs to and the
//! keywords whose annotations it reads. Priorities are derived from those
//! dependency edges so a keyword always runs after the keywords it depends on.

mod builtin;

use crate::draft::{Draft, DraftSet};
use crate::error::{Error, Result};
use crate::keywords::Keyword;
use crate::schema::ParseContext;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Builds a keyword instance from its raw value and the enclosing schema object
pub type KeywordParser =
    fn(&Value, &Map<String, Value>, &mut ParseContext<'_>) -> Result<Box<dyn Keyword>>;

/// Priority pinned for `$schema`
pub const SCHEMA_PRIORITY: i64 = -2;
/// Priority pinned for `$id`
pub const ID_PRIORITY: i64 = -1;
/// Priority pinned for the `unevaluated*` keywords
pub const UNEVALUATED_PRIORITY: i64 = i64::MAX;

static STANDARD: OnceLock<Arc<KeywordCatalog>> = OnceLock::new();

fn pinned_priority(name: &str) -> Option<i64> {
    match name {
        "$schema" => Some(SCHEMA_PRIORITY),
        "$id" => Some(ID_PRIORITY),
        "unevaluatedItems" | "unevaluatedProperties" => Some(UNEVALUATED_PRIORITY),
        _ => None,
    }
}

/// Registration record for a keyword kind
#[derive(Clone)]
pub struct KeywordSpec {
    pub name: String,
    pub drafts: DraftSet,
    pub vocabularies: Vec<String>,
    pub depends_on: Vec<String>,
    pub annotation_only: bool,
    pub parser: KeywordParser,
}

impl KeywordSpec {
    pub fn new(name: impl Into<String>, drafts: DraftSet, parser: KeywordParser) -> Self {
        Self {
            name: name.into(),
            drafts,
            vocabularies: Vec::new(),
            depends_on: Vec::new(),
            annotation_only: false,
            parser,
        }
    }

    /// Add vocabulary memberships
    pub fn vocabularies(mut self, uris: &[&str]) -> Self {
        self.vocabularies.extend(uris.iter().map(|u| u.to_string()));
        self
    }

    /// Declare the keywords whose annotations this keyword reads
    pub fn depends_on(mut self, names: &[&str]) -> Self {
        self.depends_on.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Mark the keyword as never affecting validity
    pub fn annotation_only(mut self) -> Self {
        self.annotation_only = true;
        self
    }
}

impl fmt::Debug for KeywordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordSpec")
            .field("name", &self.name)
            .field("drafts", &self.drafts)
            .field("vocabularies", &self.vocabularies)
            .field("depends_on", &self.depends_on)
            .field("annotation_only", &self.annotation_only)
            .finish()
    }
}

/// A registered keyword kind with its computed priority
#[derive(Debug, Clone)]
pub struct KeywordDescriptor {
    spec: KeywordSpec,
    priority: i64,
    produces_dependent_annotations: bool,
    unrecognized: bool,
}

impl KeywordDescriptor {
    fn new(spec: KeywordSpec) -> Self {
        Self {
            spec,
            priority: 0,
            produces_dependent_annotations: false,
            unrecognized: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn drafts(&self) -> DraftSet {
        self.spec.drafts
    }

    pub fn supports(&self, draft: Draft) -> bool {
        self.spec.drafts.contains(draft)
    }

    pub fn vocabularies(&self) -> &[String] {
        &self.spec.vocabularies
    }

    pub fn depends_on(&self) -> &[String] {
        &self.spec.depends_on
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Whether another keyword reads this keyword's annotations
    pub fn produces_dependent_annotations(&self) -> bool {
        self.produces_dependent_annotations
    }

    pub fn is_annotation_only(&self) -> bool {
        self.spec.annotation_only
    }

    /// Whether this is the stand-in for names missing from the catalog
    pub fn is_unrecognized(&self) -> bool {
        self.unrecognized
    }

    pub fn parser(&self) -> KeywordParser {
        self.spec.parser
    }
}

/// Table of keyword kinds, consulted by the parser and the evaluator
#[derive(Debug, Clone)]
pub struct KeywordCatalog {
    descriptors: Vec<Arc<KeywordDescriptor>>,
    index: HashMap<String, usize>,
    unrecognized: Arc<KeywordDescriptor>,
}

impl Default for KeywordCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordCatalog {
    /// An empty catalog; every keyword is unrecognized
    pub fn new() -> Self {
        let mut unrecognized = KeywordDescriptor::new(
            KeywordSpec::new("", DraftSet::ALL, crate::keywords::metadata::parse_unrecognized)
                .annotation_only(),
        );
        unrecognized.unrecognized = true;
        Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
            unrecognized: Arc::new(unrecognized),
        }
    }

    /// A fresh catalog holding every built-in keyword
    pub fn with_builtins() -> Result<Self> {
        let mut catalog = Self::new();
        for spec in builtin::specs() {
            catalog.insert(spec)?;
        }
        catalog.resolve_priorities()?;
        debug!(keywords = catalog.len(), "Built keyword catalog");
        Ok(catalog)
    }

    /// The shared, immutable built-in catalog
    pub fn standard() -> Arc<KeywordCatalog> {
        STANDARD
            .get_or_init(|| {
                Arc::new(
                    Self::with_builtins()
                        .expect("built-in keyword table has no dependency cycles"),
                )
            })
            .clone()
    }

    /// Register a keyword kind and recompute priorities.
    ///
    /// On failure the catalog is left unchanged.
    pub fn register(&mut self, spec: KeywordSpec) -> Result<()> {
        let name = spec.name.clone();
        self.insert(spec)?;
        if let Err(e) = self.resolve_priorities() {
            self.remove(&name);
            // Restore the priorities computed before the failed insert
            self.resolve_priorities()?;
            return Err(e);
        }
        debug!(keyword = %name, "Registered keyword");
        Ok(())
    }

    fn insert(&mut self, spec: KeywordSpec) -> Result<()> {
        if spec.name.is_empty() {
            return Err(Error::configuration("Keyword registration is missing a name"));
        }
        if spec.drafts.is_empty() {
            return Err(Error::configuration(format!(
                "Keyword '{}' does not declare any supported draft",
                spec.name
            )));
        }
        if self.index.contains_key(&spec.name) {
            return Err(Error::configuration(format!(
                "Keyword '{}' is already registered",
                spec.name
            )));
        }
        self.index.insert(spec.name.clone(), self.descriptors.len());
        self.descriptors.push(Arc::new(KeywordDescriptor::new(spec)));
        Ok(())
    }

    fn remove(&mut self, name: &str) {
        if let Some(position) = self.index.remove(name) {
            self.descriptors.remove(position);
            for slot in self.index.values_mut() {
                if *slot > position {
                    *slot -= 1;
                }
            }
        }
    }

    /// Recompute every priority from the dependency edges.
    ///
    /// Pinned keywords are assigned first. The rest are assigned in tiers:
    /// each pass gives the current tier to every keyword whose dependencies
    /// were all prioritized before the pass started. A pass that assigns
    /// nothing means the remaining keywords form a cycle.
    pub fn resolve_priorities(&mut self) -> Result<()> {
        let mut priorities: HashMap<String, i64> = HashMap::new();
        let mut producers: HashSet<String> = HashSet::new();

        for descriptor in &self.descriptors {
            let name = descriptor.name();
            if let Some(priority) = pinned_priority(name) {
                priorities.insert(name.to_string(), priority);
            }
            for dependency in descriptor.depends_on() {
                if self.index.contains_key(dependency) {
                    producers.insert(dependency.clone());
                }
            }
        }

        let mut pending: Vec<&str> = self
            .descriptors
            .iter()
            .map(|d| d.name())
            .filter(|name| !priorities.contains_key(*name))
            .collect();

        let mut tier = 0i64;
        while !pending.is_empty() {
            let eligible: Vec<&str> = pending
                .iter()
                .copied()
                .filter(|name| {
                    self.dependencies_of(name)
                        .all(|dep| dep == *name || priorities.contains_key(dep))
                })
                .collect();

            if eligible.is_empty() {
                let mut cycle: Vec<&str> = pending.clone();
                cycle.sort_unstable();
                return Err(Error::configuration(format!(
                    "Keyword dependency cycle among: {}",
                    cycle.join(", ")
                )));
            }

            for name in &eligible {
                priorities.insert(name.to_string(), tier);
            }
            pending.retain(|name| !eligible.contains(name));
            tier += 1;
        }

        for descriptor in &mut self.descriptors {
            let name = descriptor.name().to_string();
            let descriptor = Arc::make_mut(descriptor);
            descriptor.priority = priorities.get(&name).copied().unwrap_or(0);
            descriptor.produces_dependent_annotations = producers.contains(&name);
        }
        Ok(())
    }

    fn dependencies_of<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.index
            .get(name)
            .map(|&i| self.descriptors[i].depends_on())
            .unwrap_or(&[])
            .iter()
            .map(String::as_str)
            .filter(move |dep| self.index.contains_key(*dep))
    }

    /// Look up a keyword kind by name
    pub fn get(&self, name: &str) -> Option<&Arc<KeywordDescriptor>> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Look up a keyword kind, falling back to the unrecognized descriptor
    pub fn get_or_unrecognized(&self, name: &str) -> &Arc<KeywordDescriptor> {
        self.get(name).unwrap_or(&self.unrecognized)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The pseudo-descriptor used for names missing from the catalog
    pub fn unrecognized(&self) -> &Arc<KeywordDescriptor> {
        &self.unrecognized
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<KeywordDescriptor>> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::metadata::parse_annotation;

    fn spec(name: &str, deps: &[&str]) -> KeywordSpec {
        KeywordSpec::new(name, DraftSet::ALL, parse_annotation).depends_on(deps)
    }

    #[test]
    fn test_pinned_priorities() {
        let catalog = KeywordCatalog::standard();
        assert_eq!(catalog.get("$schema").unwrap().priority(), SCHEMA_PRIORITY);
        assert_eq!(catalog.get("$id").unwrap().priority(), ID_PRIORITY);
        assert_eq!(catalog.get("unevaluatedItems").unwrap().priority(), i64::MAX);
        assert_eq!(catalog.get("unevaluatedProperties").unwrap().priority(), i64::MAX);
    }

    #[test]
    fn test_dependencies_run_first() {
        let catalog = KeywordCatalog::standard();
        for descriptor in catalog.descriptors() {
            for dep in descriptor.depends_on() {
                if dep == descriptor.name() {
                    continue;
                }
                let dependency = catalog.get(dep).unwrap();
                assert!(
                    dependency.priority() < descriptor.priority(),
                    "{} should run before {}",
                    dep,
                    descriptor.name()
                );
                assert!(dependency.produces_dependent_annotations());
            }
        }
    }

    #[test]
    fn test_tiers() {
        let mut catalog = KeywordCatalog::new();
        catalog.register(spec("a", &[])).unwrap();
        catalog.register(spec("b", &["a"])).unwrap();
        catalog.register(spec("c", &["a", "b"])).unwrap();
        catalog.register(spec("d", &["missing"])).unwrap();

        assert_eq!(catalog.get("a").unwrap().priority(), 0);
        assert_eq!(catalog.get("d").unwrap().priority(), 0);
        assert_eq!(catalog.get("b").unwrap().priority(), 1);
        assert_eq!(catalog.get("c").unwrap().priority(), 2);
        assert!(catalog.get("a").unwrap().produces_dependent_annotations());
        assert!(!catalog.get("c").unwrap().produces_dependent_annotations());
    }

    #[test]
    fn test_cycle_fails_closed() {
        let mut catalog = KeywordCatalog::new();
        catalog.register(spec("x", &["y"])).unwrap();
        let before = catalog.get("x").unwrap().priority();

        let err = catalog.register(spec("y", &["x"])).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("cycle"));
        assert!(!catalog.contains("y"));
        assert_eq!(catalog.get("x").unwrap().priority(), before);
    }

    #[test]
    fn test_invalid_registrations() {
        let mut catalog = KeywordCatalog::new();
        assert!(catalog.register(spec("", &[])).is_err());
        assert!(catalog
            .register(KeywordSpec::new("x-empty", DraftSet::EMPTY, parse_annotation))
            .is_err());
        catalog.register(spec("x-dup", &[])).unwrap();
        assert!(catalog.register(spec("x-dup", &[])).is_err());
    }

    #[test]
    fn test_unrecognized_descriptor() {
        let catalog = KeywordCatalog::standard();
        let descriptor = catalog.get_or_unrecognized("x-vendor-extension");
        assert!(descriptor.is_unrecognized());
        assert_eq!(descriptor.priority(), 0);
        assert!(descriptor.is_annotation_only());
        for draft in Draft::ALL {
            assert!(descriptor.supports(draft));
        }
    }

    #[test]
    fn test_custom_keyword_on_standard_set() {
        let mut catalog = KeywordCatalog::with_builtins().unwrap();
        catalog
            .register(spec("x-after-properties", &["properties"]))
            .unwrap();
        let custom = catalog.get("x-after-properties").unwrap();
        assert!(custom.priority() > catalog.get("properties").unwrap().priority());
    }
}
