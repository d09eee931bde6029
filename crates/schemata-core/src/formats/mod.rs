//! Format plugins for the `format` keyword
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! A [`Format`] checks string instances against a named format. Formats are
//! collected in a [`FormatRegistry`]; names missing from the registry resolve
//! to an [`UnknownFormat`], which only fails when unknown formats are
//! rejected by the options.

mod builtin;

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A named format check.
///
/// `validate` returns `Err(None)` for a plain mismatch or `Err(Some(detail))`
/// when the format can explain the problem.
pub trait Format: Send + Sync + fmt::Debug {
    fn key(&self) -> &str;

    fn validate(&self, value: &Value) -> std::result::Result<(), Option<String>>;

    /// Whether this format actually checks anything
    fn is_known(&self) -> bool {
        true
    }
}

/// Format backed by a regular expression over string instances
#[derive(Debug, Clone)]
pub struct RegexFormat {
    key: String,
    regex: Regex,
}

impl RegexFormat {
    pub fn new(key: impl Into<String>, pattern: &str) -> Result<Self> {
        let key = key.into();
        let regex = Regex::new(pattern).map_err(|e| {
            Error::configuration(format!("Invalid pattern for format '{}': {}", key, e))
        })?;
        Ok(Self { key, regex })
    }
}

impl Format for RegexFormat {
    fn key(&self) -> &str {
        &self.key
    }

    fn validate(&self, value: &Value) -> std::result::Result<(), Option<String>> {
        match value {
            Value::String(s) if !self.regex.is_match(s) => Err(None),
            _ => Ok(()),
        }
    }
}

/// Stand-in for format names nothing is registered for
#[derive(Debug, Clone)]
pub struct UnknownFormat {
    key: String,
}

impl UnknownFormat {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Format for UnknownFormat {
    fn key(&self) -> &str {
        &self.key
    }

    fn validate(&self, _value: &Value) -> std::result::Result<(), Option<String>> {
        Ok(())
    }

    fn is_known(&self) -> bool {
        false
    }
}

/// Format defined by a predicate over string instances
#[derive(Clone)]
pub(crate) struct PredicateFormat {
    key: &'static str,
    check: fn(&str) -> std::result::Result<(), Option<String>>,
}

impl PredicateFormat {
    pub(crate) const fn new(
        key: &'static str,
        check: fn(&str) -> std::result::Result<(), Option<String>>,
    ) -> Self {
        Self { key, check }
    }
}

impl fmt::Debug for PredicateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateFormat").field("key", &self.key).finish()
    }
}

impl Format for PredicateFormat {
    fn key(&self) -> &str {
        self.key
    }

    fn validate(&self, value: &Value) -> std::result::Result<(), Option<String>> {
        match value {
            Value::String(s) => (self.check)(s),
            _ => Ok(()),
        }
    }
}

static STANDARD: OnceLock<Arc<FormatRegistry>> = OnceLock::new();

/// Lookup table of formats by name
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn Format>>,
}

impl FormatRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in format
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for format in builtin::formats() {
            registry.register(format);
        }
        registry
    }

    /// The shared built-in registry
    pub fn shared_standard() -> Arc<FormatRegistry> {
        STANDARD.get_or_init(|| Arc::new(Self::standard())).clone()
    }

    /// Add a format, replacing any format with the same key
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats.insert(format.key().to_string(), Arc::new(format));
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Format>> {
        self.formats.get(key).cloned()
    }

    /// The format registered under `key`, or an [`UnknownFormat`]
    pub fn resolve(&self, key: &str) -> Arc<dyn Format> {
        self.get(key)
            .unwrap_or_else(|| Arc::new(UnknownFormat::new(key)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.formats.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_regex_format() {
        let hex = RegexFormat::new("hexadecimal", "^[0-9a-fA-F]+$").unwrap();
        assert!(hex.validate(&json!("abc123")).is_ok());
        assert!(hex.validate(&json!("xyz")).is_err());
        assert!(hex.validate(&json!(42)).is_ok());
        assert!(RegexFormat::new("broken", "(").is_err());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = FormatRegistry::standard();
        assert!(registry.resolve("date").is_known());
        let unknown = registry.resolve("not-a-format");
        assert!(!unknown.is_known());
        assert_eq!(unknown.key(), "not-a-format");
        assert!(unknown.validate(&json!("anything")).is_ok());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FormatRegistry::standard();
        let before = registry.len();
        registry.register(RegexFormat::new("date", "^x$").unwrap());
        assert_eq!(registry.len(), before);
        assert!(registry.resolve("date").validate(&json!("2020-01-01")).is_err());
    }
}
