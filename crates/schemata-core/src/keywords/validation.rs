//! Validation vocabulary: assertions over a single instance value
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! Every assertion passes vacuously when the instance is not of the kind it
//! constrains.

use super::{expect_bool, expect_count, expect_number, expect_object, listing, string_list, Keyword};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::instance::{describe, json_equal, kind_of, string_length, SchemaValueType};
use crate::schema::ParseContext;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// Compare two JSON numbers, exactly when both are integers
pub fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (left.as_u64(), right.as_u64()) {
        return Some(a.cmp(&b));
    }
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

#[derive(Debug)]
pub struct Type {
    expected: Vec<SchemaValueType>,
}

impl Keyword for Type {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let actual = kind_of(ctx.instance());
        if !self.expected.iter().any(|t| t.accepts(actual)) {
            let expected: Vec<&str> = self.expected.iter().map(|t| t.as_str()).collect();
            let message = ctx.message(
                "type",
                &[("received", actual.to_string()), ("expected", expected.join(" or "))],
            );
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_type(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let names = match value {
        Value::String(name) => vec![name.clone()],
        Value::Array(_) => string_list(value, ctx)?,
        _ => return Err(ctx.error("Expected a type name or an array of type names")),
    };
    let expected = names
        .iter()
        .map(|name| {
            SchemaValueType::from_name(name).ok_or_else(|| ctx.error(format!("Unknown type '{}'", name)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(Type { expected }))
}

#[derive(Debug)]
pub struct Enum {
    values: Vec<Value>,
}

impl Keyword for Enum {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let instance = ctx.instance();
        if !self.values.iter().any(|v| json_equal(v, instance)) {
            let message = ctx.message("enum", &[("received", describe(instance))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_enum(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let values = value
        .as_array()
        .ok_or_else(|| ctx.error("Expected an array of values"))?;
    Ok(Box::new(Enum {
        values: values.clone(),
    }))
}

#[derive(Debug)]
pub struct Const {
    value: Value,
}

impl Keyword for Const {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        if !json_equal(&self.value, ctx.instance()) {
            let message = ctx.message("const", &[("value", describe(&self.value))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_const(value: &Value, _: &Map<String, Value>, _ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Const { value: value.clone() }))
}

#[derive(Debug)]
pub struct MultipleOf {
    divisor: Number,
}

impl MultipleOf {
    fn divides(&self, value: &Number) -> bool {
        if let (Some(x), Some(d)) = (value.as_i64(), self.divisor.as_i64()) {
            return d != 0 && x % d == 0;
        }
        match (value.as_f64(), self.divisor.as_f64()) {
            (Some(x), Some(d)) => {
                let quotient = x / d;
                quotient.is_finite() && (quotient - quotient.round()).abs() < 1e-9 * quotient.abs().max(1.0)
            }
            _ => false,
        }
    }
}

impl Keyword for MultipleOf {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Value::Number(n) = ctx.instance() else {
            return Ok(());
        };
        if !self.divides(n) {
            let message = ctx.message(
                "multipleOf",
                &[("received", n.to_string()), ("divisor", self.divisor.to_string())],
            );
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_multiple_of(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let divisor = expect_number(value, ctx)?;
    if divisor.as_f64().map(|d| d <= 0.0).unwrap_or(true) {
        return Err(ctx.error("Expected a number greater than zero"));
    }
    Ok(Box::new(MultipleOf {
        divisor: divisor.clone(),
    }))
}

/// `maximum`, `exclusiveMaximum`, `minimum` and `exclusiveMinimum`
#[derive(Debug)]
pub struct Bound {
    key: &'static str,
    limit: Number,
    rejects: fn(Ordering) -> bool,
}

impl Keyword for Bound {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Value::Number(n) = ctx.instance() else {
            return Ok(());
        };
        if compare_numbers(n, &self.limit).map(self.rejects).unwrap_or(false) {
            let message = ctx.message(
                self.key,
                &[("received", n.to_string()), ("limit", self.limit.to_string())],
            );
            ctx.fail(message);
        }
        Ok(())
    }
}

fn bound(
    key: &'static str,
    rejects: fn(Ordering) -> bool,
    value: &Value,
    ctx: &ParseContext<'_>,
) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Bound {
        key,
        limit: expect_number(value, ctx)?.clone(),
        rejects,
    }))
}

pub fn parse_maximum(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    bound("maximum", |o| o == Ordering::Greater, value, ctx)
}

pub fn parse_exclusive_maximum(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    bound("exclusiveMaximum", |o| o != Ordering::Less, value, ctx)
}

pub fn parse_minimum(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    bound("minimum", |o| o == Ordering::Less, value, ctx)
}

pub fn parse_exclusive_minimum(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    bound("exclusiveMinimum", |o| o != Ordering::Greater, value, ctx)
}

/// What a [`Limit`] counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    Characters,
    Items,
    Properties,
}

impl Measure {
    fn of(self, value: &Value) -> Option<usize> {
        match (self, value) {
            (Measure::Characters, Value::String(s)) => Some(string_length(s)),
            (Measure::Items, Value::Array(items)) => Some(items.len()),
            (Measure::Properties, Value::Object(map)) => Some(map.len()),
            _ => None,
        }
    }
}

/// The `max*` and `min*` size keywords
#[derive(Debug)]
pub struct Limit {
    key: &'static str,
    measure: Measure,
    limit: u64,
    maximum: bool,
}

impl Keyword for Limit {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(size) = self.measure.of(ctx.instance()) else {
            return Ok(());
        };
        let size = size as u64;
        let violated = if self.maximum { size > self.limit } else { size < self.limit };
        if violated {
            let message = ctx.message(self.key, &[("limit", self.limit.to_string()), ("received", size.to_string())]);
            ctx.fail(message);
        }
        Ok(())
    }
}

fn limit(key: &'static str, measure: Measure, maximum: bool, value: &Value, ctx: &ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Limit {
        key,
        measure,
        limit: expect_count(value, ctx)?,
        maximum,
    }))
}

pub fn parse_max_length(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    limit("maxLength", Measure::Characters, true, value, ctx)
}

pub fn parse_min_length(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    limit("minLength", Measure::Characters, false, value, ctx)
}

pub fn parse_max_items(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    limit("maxItems", Measure::Items, true, value, ctx)
}

pub fn parse_min_items(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    limit("minItems", Measure::Items, false, value, ctx)
}

pub fn parse_max_properties(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    limit("maxProperties", Measure::Properties, true, value, ctx)
}

pub fn parse_min_properties(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    limit("minProperties", Measure::Properties, false, value, ctx)
}

#[derive(Debug)]
pub struct Pattern {
    regex: Regex,
}

impl Keyword for Pattern {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Value::String(s) = ctx.instance() else {
            return Ok(());
        };
        if !self.regex.is_match(s) {
            let message = ctx.message("pattern", &[("pattern", self.regex.as_str().to_string())]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_pattern(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let pattern = super::expect_string(value, ctx)?;
    Ok(Box::new(Pattern {
        regex: ctx.compile_regex(pattern)?,
    }))
}

#[derive(Debug)]
pub struct UniqueItems {
    enabled: bool,
}

impl Keyword for UniqueItems {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let (true, Value::Array(items)) = (self.enabled, ctx.instance()) else {
            return Ok(());
        };
        let mut duplicates = Vec::new();
        for (i, left) in items.iter().enumerate() {
            for (j, right) in items.iter().enumerate().skip(i + 1) {
                if json_equal(left, right) {
                    duplicates.push(format!("({}, {})", i, j));
                }
            }
        }
        if !duplicates.is_empty() {
            let message = ctx.message("uniqueItems", &[("duplicates", duplicates.join(", "))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_unique_items(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(UniqueItems {
        enabled: expect_bool(value, ctx)?,
    }))
}

/// `maxContains` and `minContains`, reading the sibling `contains` matches
#[derive(Debug)]
pub struct ContainsLimit {
    key: &'static str,
    limit: u64,
    maximum: bool,
}

impl Keyword for ContainsLimit {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        if !ctx.instance().is_array() {
            return Ok(());
        }
        let Some(Value::Array(matched)) = ctx.sibling_annotation("contains") else {
            return Ok(());
        };
        let count = matched.len() as u64;
        let violated = if self.maximum { count > self.limit } else { count < self.limit };
        if violated {
            let message = ctx.message(self.key, &[("limit", self.limit.to_string()), ("received", count.to_string())]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_max_contains(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(ContainsLimit {
        key: "maxContains",
        limit: expect_count(value, ctx)?,
        maximum: true,
    }))
}

pub fn parse_min_contains(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(ContainsLimit {
        key: "minContains",
        limit: expect_count(value, ctx)?,
        maximum: false,
    }))
}

#[derive(Debug)]
pub struct Required {
    names: Vec<String>,
}

impl Keyword for Required {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };
        let missing: Vec<String> = self
            .names
            .iter()
            .filter(|name| !object.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let message = ctx.message("required", &[("missing", listing(&missing))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_required(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Required {
        names: string_list(value, ctx)?,
    }))
}

#[derive(Debug)]
pub struct DependentRequired {
    dependencies: Vec<(String, Vec<String>)>,
}

impl Keyword for DependentRequired {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };
        let mut missing = Vec::new();
        for (name, required) in &self.dependencies {
            if !object.contains_key(name) {
                continue;
            }
            for dependency in required {
                if !object.contains_key(dependency) && !missing.contains(dependency) {
                    missing.push(dependency.clone());
                }
            }
        }
        if !missing.is_empty() {
            let message = ctx.message("dependentRequired", &[("missing", listing(&missing))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_dependent_required(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let map = expect_object(value, ctx)?;
    let mut dependencies = Vec::with_capacity(map.len());
    for (name, required) in map {
        dependencies.push((name.clone(), string_list(required, ctx)?));
    }
    Ok(Box::new(DependentRequired { dependencies }))
}
