//! `unevaluatedProperties` and `unevaluatedItems`
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! Both keywords run last in their node. They read the annotations gathered
//! on the node, including those forwarded from passing in-place subschemas,
//! and apply their subschema to whatever no other keyword evaluated.

use super::{listing, Keyword};
use crate::context::EvaluationContext;
use crate::draft::Draft;
use crate::error::Result;
use crate::schema::{ParseContext, SchemaNode};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

const PROPERTY_PRODUCERS: [&str; 4] = [
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
];

const ITEM_PRODUCERS: [&str; 4] = ["prefixItems", "items", "additionalItems", "unevaluatedItems"];

/// Annotations of `producer` visible to the node: those gathered on it from
/// passing keywords and subschemas, plus the sibling keyword's own annotation
/// even when that keyword failed
fn produced<'c>(ctx: &'c EvaluationContext<'_>, producer: &str) -> impl Iterator<Item = &'c Value> {
    ctx.node_annotation(producer)
        .into_iter()
        .chain(ctx.sibling_annotation(producer))
}

#[derive(Debug)]
pub struct UnevaluatedProperties {
    schema: Arc<SchemaNode>,
}

impl Keyword for UnevaluatedProperties {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(object) = ctx.instance().as_object() else {
            return Ok(());
        };

        let seen: HashSet<String> = PROPERTY_PRODUCERS
            .iter()
            .flat_map(|producer| produced(ctx, producer))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();

        let short_circuit = ctx.options().short_circuits();
        let mut evaluated = Vec::new();
        let mut failed = Vec::new();
        for name in object.keys().filter(|name| !seen.contains(*name)) {
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
            let message = ctx.message("unevaluatedProperties", &[("properties", listing(&failed))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_unevaluated_properties(
    value: &Value,
    _: &Map<String, Value>,
    ctx: &mut ParseContext<'_>,
) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(UnevaluatedProperties {
        schema: ctx.subschema(value, &[])?,
    }))
}

#[derive(Debug)]
pub struct UnevaluatedItems {
    schema: Arc<SchemaNode>,
}

impl UnevaluatedItems {
    /// Index of the first item not covered by a positional annotation, or
    /// `None` when some producer covered every item
    fn first_unevaluated(ctx: &EvaluationContext<'_>) -> Option<usize> {
        let mut start = 0;
        for annotation in ITEM_PRODUCERS.iter().flat_map(|producer| produced(ctx, producer)) {
            match annotation {
                Value::Bool(true) => return None,
                Value::Number(n) => {
                    if let Some(largest) = n.as_u64() {
                        start = start.max(largest as usize + 1);
                    }
                }
                _ => {}
            }
        }
        Some(start)
    }
}

impl Keyword for UnevaluatedItems {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let Some(items) = ctx.instance().as_array() else {
            return Ok(());
        };
        let Some(start) = Self::first_unevaluated(ctx) else {
            return Ok(());
        };

        let contained: HashSet<usize> = if ctx.draft() >= Draft::Draft202012 {
            ctx.node_annotation("contains")
                .and_then(Value::as_array)
                .map(|indices| {
                    indices
                        .iter()
                        .filter_map(Value::as_u64)
                        .map(|i| i as usize)
                        .collect()
                })
                .unwrap_or_default()
        } else {
            HashSet::new()
        };

        let short_circuit = ctx.options().short_circuits();
        let mut any = false;
        let mut failed = Vec::new();
        for i in (start..items.len()).filter(|i| !contained.contains(i)) {
            any = true;
            if !ctx.evaluate_item(i, &self.schema, &[])? {
                failed.push(i);
                if short_circuit {
                    break;
                }
            }
        }

        if any {
            ctx.annotate(Value::Bool(true));
        }
        if !failed.is_empty() {
            let message = ctx.message("unevaluatedItems", &[("indices", listing(&failed))]);
            ctx.fail(message);
        }
        Ok(())
    }
}

pub fn parse_unevaluated_items(
    value: &Value,
    _: &Map<String, Value>,
    ctx: &mut ParseContext<'_>,
) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(UnevaluatedItems {
        schema: ctx.subschema(value, &[])?,
    }))
}

#[cfg(test)]
mod tests {
    use crate::{JsonSchema, OutputFormat, ValidationOptions};
    use serde_json::{json, Value};

    fn check(schema: Value, instance: Value) -> bool {
        let options = ValidationOptions::default().with_output_format(OutputFormat::Hierarchical);
        JsonSchema::from_value(schema)
            .unwrap()
            .validate(&instance, &options)
            .unwrap()
            .is_valid()
    }

    #[test]
    fn test_sees_properties_through_all_of() {
        let schema = json!({
            "allOf": [{"properties": {"a": true}}],
            "properties": {"b": true},
            "unevaluatedProperties": false
        });
        assert!(check(schema.clone(), json!({"a": 1, "b": 2})));
        assert!(!check(schema, json!({"a": 1, "b": 2, "c": 3})));
    }

    #[test]
    fn test_failed_branch_does_not_count() {
        let schema = json!({
            "anyOf": [
                {"properties": {"a": {"type": "string"}}, "required": ["a"]},
                {"properties": {"b": true}, "required": ["b"]}
            ],
            "unevaluatedProperties": false
        });
        assert!(check(schema.clone(), json!({"b": 1})));
        assert!(!check(schema, json!({"a": 1, "b": 1})));
    }

    #[test]
    fn test_unevaluated_items() {
        let schema = json!({"prefixItems": [true], "unevaluatedItems": false});
        assert!(check(schema.clone(), json!([1])));
        assert!(!check(schema, json!([1, 2])));

        let with_contains = json!({"contains": {"type": "string"}, "unevaluatedItems": {"type": "integer"}});
        assert!(check(with_contains.clone(), json!(["a", 1])));
        assert!(!check(with_contains, json!(["a", 1.5])));

        let covered = json!({"items": true, "unevaluatedItems": false});
        assert!(check(covered, json!([1, 2, 3])));
    }

    #[test]
    fn test_runs_after_failure_with_flag_output() {
        let schema = JsonSchema::from_value(json!({
            "properties": {"a": {"type": "string"}},
            "unevaluatedProperties": false
        }))
        .unwrap();
        let results = schema
            .validate(&json!({"a": 1, "b": 2}), &ValidationOptions::default())
            .unwrap();
        assert!(!results.is_valid());
        let names: Vec<&str> = results
            .root()
            .children
            .iter()
            .filter_map(|child| child.keyword.as_deref())
            .collect();
        assert_eq!(names, vec!["properties", "unevaluatedProperties"]);
    }
}
