//! Applicator keywords
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! Applicators evaluate subschemas against the current instance or its
//! children. In-place applicators (`allOf`, `anyOf`, `oneOf`, `if`/`then`/
//! `else`, `dependentSchemas`) forward the dependency annotations of passing
//! subschemas to the enclosing node so `unevaluated*` can see them.

use super::{expect_object, listing, schema_list, schema_map, string_list, Keyword};
use crate::context::EvaluationContext;
use crate::draft::Draft;
use crate::error::Result;
use crate::schema::{ParseContext, SchemaNode};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug)]
pub struct AllOf {
    schemas: Vec<Arc<SchemaNode>>,
}

impl Keyword for AllOf {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let short_circuit = ctx.options().short_circuits();
        let mut all_valid = true;
        for (i, schema) in self.schemas.iter().enumerate() {
            if !ctx.evaluate_in_place(schema, &[i.to_string().as_str()], true)? {
                all_valid = false;
                if short_circuit {
                    break;
                }
            }
        }
        if !all_valid {
            ctx.invalidate();
        }
        Ok(())
    }
}

pub fn parse_all_of(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(AllOf {
        schemas: schema_list(value, ctx)?,
    }))
}

#[derive(Debug)]
pub struct AnyOf {
    schemas: Vec<Arc<SchemaNode>>,
}

impl Keyword for AnyOf {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        // Every passing branch contributes annotations to unevaluated*
        let short_circuit = ctx.options().short_circuits() && !ctx.annotations_needed();
        let mut matched = 0;
        for (i, schema) in self.schemas.iter().enumerate() {
            if ctx.evaluate_in_place(schema, &[i.to_string().as_str()], true)? {
                matched += 1;
                if short_circuit {
                    break;
                }
            }
        }
        if matched == 0 {
            let message = ctx.message("anyOf", &[("count", self.schemas.len().to_string())]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_any_of(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(AnyOf {
        schemas: schema_list(value, ctx)?,
    }))
}

#[derive(Debug)]
pub struct OneOf {
    schemas: Vec<Arc<SchemaNode>>,
}

impl Keyword for OneOf {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let short_circuit = ctx.options().short_circuits();
        let mut matched = 0;
        for (i, schema) in self.schemas.iter().enumerate() {
            if ctx.evaluate_in_place(schema, &[i.to_string().as_str()], true)? {
                matched += 1;
                if short_circuit && matched > 1 {
                    break;
                }
            }
        }
        if matched != 1 {
            let message = ctx.message("oneOf", &[("count", matched.to_string())]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_one_of(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(OneOf {
        schemas: schema_list(value, ctx)?,
    }))
}

#[derive(Debug)]
pub struct Not {
    schema: Arc<SchemaNode>,
}

impl Keyword for Not {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        if ctx.evaluate_in_place(&self.schema, &[], false)? {
            let message = ctx.message("not", &[]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_not(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Not {
        schema: ctx.subschema(value, &[])?,
    }))
}

/// `if`: annotates whether the condition held
#[derive(Debug)]
pub struct If {
    schema: Arc<SchemaNode>,
}

impl Keyword for If {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let held = ctx.evaluate_in_place(&self.schema, &[], true)?;
        ctx.annotate(Value::Bool(held));
        Ok(())
    }
}

pub fn parse_if(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(If {
        schema: ctx.subschema(value, &[])?,
    }))
}

/// `then` and `else`, applied when the sibling `if` annotated `when`
#[derive(Debug)]
pub struct Branch {
    schema: Arc<SchemaNode>,
    when: bool,
}

impl Keyword for Branch {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        if ctx.sibling_annotation("if") != Some(&Value::Bool(self.when)) {
            return Ok(());
        }
        if !ctx.evaluate_in_place(&self.schema, &[], true)? {
            ctx.invalidate();
        }
        Ok(())
    }
}

pub fn parse_then(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Branch {
        schema: ctx.subschema(value, &[])?,
        when: true,
    }))
}

pub fn parse_else(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Branch {
        schema: ctx.subschema(value, &[])?,
        when: false,
    }))
}

#[derive(Debug)]
pub struct DependentSchemas {
    schemas: Vec<(String, Arc<SchemaNode>)>,
}

impl Keyword for DependentSchemas {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };
        let mut failed = Vec::new();
        for (name, schema) in &self.schemas {
            if object.contains_key(name) && !ctx.evaluate_in_place(schema, &[name.as_str()], true)? {
                failed.push(name.clone());
            }
        }
        if !failed.is_empty() {
            let message = ctx.message("dependentSchemas", &[("failed", listing(&failed))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_dependent_schemas(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(DependentSchemas {
        schemas: schema_map(value, ctx)?,
    }))
}

#[derive(Debug)]
enum Dependency {
    Schema(Arc<SchemaNode>),
    Required(Vec<String>),
}

/// Legacy `dependencies`, mixing property lists and schemas
#[derive(Debug)]
pub struct Dependencies {
    entries: Vec<(String, Dependency)>,
}

impl Keyword for Dependencies {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };
        let mut missing = Vec::new();
        let mut failed = Vec::new();
        for (name, dependency) in &self.entries {
            if !object.contains_key(name) {
                continue;
            }
            match dependency {
                Dependency::Required(required) => {
                    missing.extend(required.iter().filter(|r| !object.contains_key(*r)).cloned());
                }
                Dependency::Schema(schema) => {
                    if !ctx.evaluate_in_place(schema, &[name.as_str()], true)? {
                        failed.push(name.clone());
                    }
                }
            }
        }
        if !missing.is_empty() {
            let message = ctx.message("dependentRequired", &[("missing", listing(&missing))]);
            ctx.fail(message);
        }
        if !failed.is_empty() {
            let message = ctx.message("dependentSchemas", &[("failed", listing(&failed))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_dependencies(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let map = expect_object(value, ctx)?;
    let mut entries = Vec::with_capacity(map.len());
    for (name, item) in map {
        let dependency = if item.is_array() {
            Dependency::Required(string_list(item, ctx)?)
        } else {
            Dependency::Schema(ctx.subschema(item, &[name.as_str()])?)
        };
        entries.push((name.clone(), dependency));
    }
    Ok(Box::new(Dependencies { entries }))
}

#[derive(Debug)]
pub struct Properties {
    schemas: Vec<(String, Arc<SchemaNode>)>,
}

impl Keyword for Properties {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };
        let short_circuit = ctx.options().short_circuits();
        let mut evaluated = Vec::new();
        let mut failed = Vec::new();
        for (name, schema) in &self.schemas {
            if !object.contains_key(name) {
                continue;
            }
            evaluated.push(name.clone());
            if !ctx.evaluate_property(name, schema, &[name.as_str()])? {
                failed.push(name.clone());
                if short_circuit {
                    break;
                }
            }
        }
        ctx.annotate(Value::from(evaluated));
        if !failed.is_empty() {
            let message = ctx.message("properties", &[("properties", listing(&failed))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_properties(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Properties {
        schemas: schema_map(value, ctx)?,
    }))
}

#[derive(Debug)]
pub struct PatternProperties {
    schemas: Vec<(String, Regex, Arc<SchemaNode>)>,
}

impl Keyword for PatternProperties {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };
        let short_circuit = ctx.options().short_circuits();
        let mut evaluated: Vec<String> = Vec::new();
        let mut failed: Vec<String> = Vec::new();
        'names: for name in object.keys() {
            for (pattern, regex, schema) in &self.schemas {
                if !regex.is_match(name) {
                    continue;
                }
                if !evaluated.contains(name) {
                    evaluated.push(name.clone());
                }
                if !ctx.evaluate_property(name, schema, &[pattern.as_str()])? {
                    if !failed.contains(name) {
                        failed.push(name.clone());
                    }
                    if short_circuit {
                        break 'names;
                    }
                }
            }
        }
        ctx.annotate(Value::from(evaluated));
        if !failed.is_empty() {
            let message = ctx.message("properties", &[("properties", listing(&failed))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_pattern_properties(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let map = expect_object(value, ctx)?;
    let mut schemas = Vec::with_capacity(map.len());
    for (pattern, item) in map {
        let regex = ctx.compile_regex(pattern)?;
        schemas.push((pattern.clone(), regex, ctx.subschema(item, &[pattern.as_str()])?));
    }
    Ok(Box::new(PatternProperties { schemas }))
}

/// `additionalProperties`, applied to names the sibling `properties` and
/// `patternProperties` do not cover
#[derive(Debug)]
pub struct AdditionalProperties {
    schema: Arc<SchemaNode>,
    named: Vec<String>,
    patterns: Vec<Regex>,
}

impl AdditionalProperties {
    fn covers(&self, name: &str) -> bool {
        self.named.iter().any(|n| n == name) || self.patterns.iter().any(|p| p.is_match(name))
    }
}

impl Keyword for AdditionalProperties {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };
        let short_circuit = ctx.options().short_circuits();
        let mut evaluated = Vec::new();
        let mut failed = Vec::new();
        for name in object.keys().filter(|name| !self.covers(name)) {
            evaluated.push(name.clone());
            if !ctx.evaluate_property(name, &self.schema, &[])? {
                failed.push(name.clone());
                if short_circuit {
                    break;
                }
            }
        }
        ctx.annotate(Value::from(evaluated));
        if !failed.is_empty() {
            let message = ctx.message("additionalProperties", &[("properties", listing(&failed))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_additional_properties(
    value: &Value,
    siblings: &Map<String, Value>,
    ctx: &mut ParseContext<'_>,
) -> Result<Box<dyn Keyword>> {
    let schema = ctx.subschema(value, &[])?;
    let named = siblings
        .get("properties")
        .and_then(Value::as_object)
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();
    let mut patterns = Vec::new();
    if let Some(map) = siblings.get("patternProperties").and_then(Value::as_object) {
        for pattern in map.keys() {
            patterns.push(ctx.compile_regex(pattern)?);
        }
    }
    Ok(Box::new(AdditionalProperties {
        schema,
        named,
        patterns,
    }))
}

#[derive(Debug)]
pub struct PropertyNames {
    schema: Arc<SchemaNode>,
}

impl Keyword for PropertyNames {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };
        let mut failed = Vec::new();
        for name in object.keys() {
            let key = Value::String(name.clone());
            if !ctx.evaluate_detached(&key, name, &self.schema, &[])? {
                failed.push(name.clone());
            }
        }
        if !failed.is_empty() {
            let message = ctx.message("propertyNames", &[("properties", listing(&failed))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_property_names(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(PropertyNames {
        schema: ctx.subschema(value, &[])?,
    }))
}

/// Annotation for a positional applicator that reached `count` of `len` items
fn positional_annotation(count: usize, len: usize) -> Option<Value> {
    if count >= len {
        Some(Value::Bool(true))
    } else if count > 0 {
        Some(Value::from(count - 1))
    } else {
        None
    }
}

fn fail_items(ctx: &mut EvaluationContext<'_>, key: &str, failed: &[usize]) {
    if !failed.is_empty() {
        let message = ctx.message(key, &[("indices", listing(failed))]);
        ctx.fail(message);
    }
}

/// Apply `schemas` positionally from index 0
fn apply_tuple(ctx: &mut EvaluationContext<'_>, schemas: &[Arc<SchemaNode>], len: usize) -> Result<Vec<usize>> {
    let short_circuit = ctx.options().short_circuits();
    let mut failed = Vec::new();
    for (i, schema) in schemas.iter().enumerate().take(len) {
        if !ctx.evaluate_item(i, schema, &[i.to_string().as_str()])? {
            failed.push(i);
            if short_circuit {
                break;
            }
        }
    }
    Ok(failed)
}

/// Apply one schema to every item from `start`
fn apply_rest(ctx: &mut EvaluationContext<'_>, schema: &Arc<SchemaNode>, start: usize, len: usize) -> Result<Vec<usize>> {
    let short_circuit = ctx.options().short_circuits();
    let mut failed = Vec::new();
    for i in start..len {
        if !ctx.evaluate_item(i, schema, &[])? {
            failed.push(i);
            if short_circuit {
                break;
            }
        }
    }
    Ok(failed)
}

#[derive(Debug)]
pub struct PrefixItems {
    schemas: Vec<Arc<SchemaNode>>,
}

impl Keyword for PrefixItems {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(items) = ctx.instance().as_array() else {
            return Ok(());
        };
        let failed = apply_tuple(ctx, &self.schemas, items.len())?;
        let count = self.schemas.len().min(items.len());
        if let Some(annotation) = positional_annotation(count, items.len()) {
            ctx.annotate(annotation);
        }
        fail_items(ctx, "items", &failed);
        Ok(())
    }
}

pub fn parse_prefix_items(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(PrefixItems {
        schemas: schema_list(value, ctx)?,
    }))
}

/// `items` as a single schema or, before 2020-12, a tuple
#[derive(Debug)]
pub enum Items {
    Single {
        schema: Arc<SchemaNode>,
        prefix: usize,
    },
    Tuple(Vec<Arc<SchemaNode>>),
}

impl Keyword for Items {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(items) = ctx.instance().as_array() else {
            return Ok(());
        };
        let len = items.len();
        match self {
            Items::Single { schema, prefix } => {
                let start = if ctx.draft() >= Draft::Draft202012 { *prefix } else { 0 };
                let failed = apply_rest(ctx, schema, start, len)?;
                if start < len {
                    ctx.annotate(Value::Bool(true));
                }
                fail_items(ctx, "items", &failed);
            }
            Items::Tuple(schemas) => {
                let failed = apply_tuple(ctx, schemas, len)?;
                if let Some(annotation) = positional_annotation(schemas.len().min(len), len) {
                    ctx.annotate(annotation);
                }
                fail_items(ctx, "items", &failed);
            }
        }
        Ok(())
    }
}

pub fn parse_items(value: &Value, siblings: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    if value.is_array() {
        if value.as_array().map(Vec::is_empty).unwrap_or(false) {
            return Ok(Box::new(Items::Tuple(Vec::new())));
        }
        return Ok(Box::new(Items::Tuple(schema_list(value, ctx)?)));
    }
    let prefix = siblings
        .get("prefixItems")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    Ok(Box::new(Items::Single {
        schema: ctx.subschema(value, &[])?,
        prefix,
    }))
}

/// `additionalItems`, applied past a tuple-form `items`
#[derive(Debug)]
pub struct AdditionalItems {
    schema: Arc<SchemaNode>,
    tuple_len: Option<usize>,
}

impl Keyword for AdditionalItems {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let (Some(items), Some(start)) = (ctx.instance().as_array(), self.tuple_len) else {
            return Ok(());
        };
        let failed = apply_rest(ctx, &self.schema, start, items.len())?;
        if start < items.len() {
            ctx.annotate(Value::Bool(true));
        }
        fail_items(ctx, "items", &failed);
        Ok(())
    }
}

pub fn parse_additional_items(
    value: &Value,
    siblings: &Map<String, Value>,
    ctx: &mut ParseContext<'_>,
) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(AdditionalItems {
        schema: ctx.subschema(value, &[])?,
        tuple_len: siblings.get("items").and_then(Value::as_array).map(Vec::len),
    }))
}

/// `contains`; annotates the indices that matched
#[derive(Debug)]
pub struct Contains {
    schema: Arc<SchemaNode>,
    min_contains: Option<u64>,
}

impl Keyword for Contains {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(items) = ctx.instance().as_array() else {
            return Ok(());
        };
        let mut matched = Vec::new();
        for i in 0..items.len() {
            if ctx.evaluate_item(i, &self.schema, &[])? {
                matched.push(i);
            }
        }
        let minimum = match self.min_contains {
            Some(min) if ctx.draft() >= Draft::Draft201909 => min,
            _ => 1,
        };
        let enough = matched.len() as u64 >= minimum;
        ctx.annotate(Value::from(matched));
        if !enough {
            let message = ctx.message("contains", &[]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_contains(value: &Value, siblings: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Contains {
        schema: ctx.subschema(value, &[])?,
        min_contains: siblings.get("minContains").and_then(Value::as_u64),
    }))
}
