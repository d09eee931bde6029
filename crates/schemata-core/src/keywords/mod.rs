//! Keyword behaviors
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! Each catalog entry names a parse function that turns a keyword's raw value
//! into a [`Keyword`]. Parsing validates the value's shape and compiles
//! subschemas and regular expressions once; evaluation then only reads the
//! instance through the [`EvaluationContext`].

pub mod applicator;
pub mod core;
pub mod data;
pub mod metadata;
pub mod unevaluated;
pub mod validation;

use crate::context::EvaluationContext;
use crate::error::Result;
use crate::schema::{ParseContext, SchemaNode};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Evaluation behavior of one keyword instance
pub trait Keyword: Send + Sync + fmt::Debug {
    /// Evaluate against `ctx.instance()`, recording failures and annotations
    /// on the context. Returned errors are structural, not assertion failures.
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()>;
}

/// A keyword that has no effect at evaluation time
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl Keyword for Inert {
    fn evaluate(&self, _ctx: &mut EvaluationContext<'_>) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn expect_string<'v>(value: &'v Value, ctx: &ParseContext<'_>) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| ctx.error("Expected a string"))
}

pub(crate) fn expect_bool(value: &Value, ctx: &ParseContext<'_>) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| ctx.error("Expected a boolean"))
}

pub(crate) fn expect_object<'v>(value: &'v Value, ctx: &ParseContext<'_>) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ctx.error("Expected an object"))
}

/// A non-negative integer; `2.0` counts as `2`
pub(crate) fn expect_count(value: &Value, ctx: &ParseContext<'_>) -> Result<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(ctx.error("Expected a non-negative integer")),
    }
}

pub(crate) fn expect_number<'v>(value: &'v Value, ctx: &ParseContext<'_>) -> Result<&'v serde_json::Number> {
    match value {
        Value::Number(n) => Ok(n),
        _ => Err(ctx.error("Expected a number")),
    }
}

pub(crate) fn string_list(value: &Value, ctx: &ParseContext<'_>) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| ctx.error("Expected an array of strings"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ctx.error("Expected an array of strings"))
        })
        .collect()
}

/// Parse a non-empty array of subschemas
pub(crate) fn schema_list(value: &Value, ctx: &mut ParseContext<'_>) -> Result<Vec<Arc<SchemaNode>>> {
    let items = match value {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(ctx.error("Expected a non-empty array of schemas")),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| ctx.subschema(item, &[i.to_string().as_str()]))
        .collect()
}

/// Parse an object whose values are subschemas
pub(crate) fn schema_map(value: &Value, ctx: &mut ParseContext<'_>) -> Result<Vec<(String, Arc<SchemaNode>)>> {
    let map = expect_object(value, ctx)?;
    map.iter()
        .map(|(name, item)| Ok((name.clone(), ctx.subschema(item, &[name.as_str()])?)))
        .collect()
}

/// Render a list of names or indices for a message, as JSON
pub(crate) fn listing<T: Clone + Into<Value>>(items: &[T]) -> String {
    Value::from(items.to_vec()).to_string()
}
