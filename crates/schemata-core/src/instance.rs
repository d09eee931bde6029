//! Read-only helpers over JSON instances
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The kinds of values the `type` keyword distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaValueType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl SchemaValueType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether a value of kind `actual` satisfies this declared type
    pub fn accepts(self, actual: SchemaValueType) -> bool {
        self == actual || (self == Self::Number && actual == Self::Integer)
    }
}

impl fmt::Display for SchemaValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a value; numbers with a zero fractional part are integers
pub fn kind_of(value: &Value) -> SchemaValueType {
    match value {
        Value::Null => SchemaValueType::Null,
        Value::Bool(_) => SchemaValueType::Boolean,
        Value::Number(_) if is_integer(value) => SchemaValueType::Integer,
        Value::Number(_) => SchemaValueType::Number,
        Value::String(_) => SchemaValueType::String,
        Value::Array(_) => SchemaValueType::Array,
        Value::Object(_) => SchemaValueType::Object,
    }
}

pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n
            .as_f64()
            .map(|f| f.is_finite() && f.fract() == 0.0)
            .unwrap_or(false),
        _ => false,
    }
}

/// Mathematical equality: `1` equals `1.0`, object key order is irrelevant
pub fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                a == b
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                a == b
            } else {
                match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).map(|y| json_equal(x, y)).unwrap_or(false))
        }
        _ => left == right,
    }
}

/// String length in Unicode scalar values
pub fn string_length(value: &str) -> usize {
    value.chars().count()
}

/// Short rendering of a value for error messages
pub fn describe(value: &Value) -> String {
    const LIMIT: usize = 64;
    let rendered = value.to_string();
    if rendered.chars().count() <= LIMIT {
        rendered
    } else {
        let truncated: String = rendered.chars().take(LIMIT).collect();
        format!("{}...", truncated)
    }
}
