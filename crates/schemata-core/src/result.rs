//! Result tree produced by an evaluation
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of evaluating one schema node or one keyword.
///
/// Node results have no `keyword`; their children are keyword results.
/// Keyword results name their keyword; their children are the node results
/// of any subschemas the keyword applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub valid: bool,
    /// Not evaluated because an earlier keyword of the node failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    pub instance_location: String,
    pub evaluation_path: String,
    pub schema_location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LocalResult>,
}

impl LocalResult {
    pub(crate) fn new(
        keyword: Option<String>,
        instance_location: String,
        evaluation_path: String,
        schema_location: String,
    ) -> Self {
        Self {
            keyword,
            valid: true,
            skipped: false,
            instance_location,
            evaluation_path,
            schema_location,
            annotations: BTreeMap::new(),
            errors: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_keyword(&self) -> bool {
        self.keyword.is_some()
    }

    pub fn annotation(&self, name: &str) -> Option<&Value> {
        self.annotations.get(name)
    }

    /// Depth-first walk over this result and every descendant
    pub fn walk(&self) -> Vec<&LocalResult> {
        let mut out = vec![self];
        let mut index = 0;
        while index < out.len() {
            let current = out[index];
            out.extend(current.children.iter());
            index += 1;
        }
        out
    }

    /// Drop the annotations of this result and of its keyword results
    pub(crate) fn strip_annotations(&mut self) {
        self.annotations.clear();
        for child in &mut self.children {
            if child.is_keyword() {
                child.annotations.clear();
            }
        }
    }
}

/// Merge `value` into the annotation stored under `name`.
///
/// `true` dominates, arrays are unioned, numbers keep the maximum, anything
/// else is replaced by the newer value.
pub fn merge_annotation(annotations: &mut BTreeMap<String, Value>, name: &str, value: Value) {
    let merged = match (annotations.remove(name), value) {
        (None, value) => value,
        (Some(Value::Bool(true)), _) | (_, Value::Bool(true)) => Value::Bool(true),
        (Some(Value::Array(mut existing)), Value::Array(incoming)) => {
            for item in incoming {
                if !existing.contains(&item) {
                    existing.push(item);
                }
            }
            Value::Array(existing)
        }
        (Some(Value::Number(a)), Value::Number(b)) => {
            let larger = match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if x > y => a,
                _ => b,
            };
            Value::Number(larger)
        }
        (Some(_), value) => value,
    };
    annotations.insert(name.to_string(), merged);
}
