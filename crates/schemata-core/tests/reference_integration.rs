//! Integration tests for reference resolution
//!
//! Covers registry lookups, injected fetchers, dynamic scope handling and the
//! traversal limit.

use schemata_core::{Error, JsonSchema, OutputFormat, SchemaRegistry, ValidationOptions};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

fn hierarchical() -> ValidationOptions {
    ValidationOptions::default().with_output_format(OutputFormat::Hierarchical)
}

#[test]
fn test_dynamic_ref_outermost_anchor_wins() {
    let schema = JsonSchema::from_value(json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://example.com/strings",
        "$ref": "list",
        "$defs": {
            "items": {"$dynamicAnchor": "items", "type": "string"},
            "list": {
                "$id": "list",
                "type": "array",
                "items": {"$dynamicRef": "#items"},
                "$defs": {
                    "items": {"$dynamicAnchor": "items"}
                }
            }
        }
    }))
    .unwrap();

    assert!(schema.validate(&json!(["a", "b"]), &hierarchical()).unwrap().is_valid());
    assert!(!schema.validate(&json!(["a", 1]), &hierarchical()).unwrap().is_valid());
}

#[test]
fn test_dynamic_ref_without_outer_anchor_uses_static_target() {
    let schema = JsonSchema::from_value(json!({
        "$id": "https://example.com/list",
        "type": "array",
        "items": {"$dynamicRef": "#items"},
        "$defs": {
            "items": {"$dynamicAnchor": "items", "type": "integer"}
        }
    }))
    .unwrap();

    assert!(schema.validate(&json!([1, 2]), &hierarchical()).unwrap().is_valid());
    assert!(!schema.validate(&json!([1, "x"]), &hierarchical()).unwrap().is_valid());
}

#[test]
fn test_recursive_ref_follows_outer_anchor() {
    let schema = JsonSchema::from_value(json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "https://example.com/strict-tree",
        "$recursiveAnchor": true,
        "$ref": "tree",
        "unevaluatedProperties": false,
        "$defs": {
            "tree": {
                "$id": "tree",
                "$recursiveAnchor": true,
                "type": "object",
                "properties": {
                    "data": true,
                    "children": {"type": "array", "items": {"$recursiveRef": "#"}}
                }
            }
        }
    }))
    .unwrap();

    let good = json!({"data": 1, "children": [{"data": 2, "children": []}]});
    let bad = json!({"data": 1, "children": [{"data": 2, "extra": true}]});
    assert!(schema.validate(&good, &hierarchical()).unwrap().is_valid());
    assert!(!schema.validate(&bad, &hierarchical()).unwrap().is_valid());
}

#[test]
fn test_default_base_uri_resolves_against_registry() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_document("http://localhost/C", json!({"type": "integer"}))
        .unwrap();
    let options = hierarchical()
        .with_registry(Arc::new(registry))
        .with_default_base_uri(Url::parse("http://localhost/").unwrap());

    let schema = JsonSchema::from_value(json!({"$ref": "/C"})).unwrap();
    assert!(schema.validate(&json!(5), &options).unwrap().is_valid());
    assert!(!schema.validate(&json!("five"), &options).unwrap().is_valid());
}

#[test]
fn test_registered_draft7_schema_with_definitions() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_document(
            "https://example.com/defs.json",
            json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "definitions": {
                    "positive": {"type": "number", "exclusiveMinimum": 0}
                }
            }),
        )
        .unwrap();
    let options = hierarchical().with_registry(Arc::new(registry));

    let schema = JsonSchema::from_value(json!({
        "properties": {
            "price": {"$ref": "https://example.com/defs.json#/definitions/positive"}
        }
    }))
    .unwrap();
    assert!(schema.validate(&json!({"price": 3.5}), &options).unwrap().is_valid());
    assert!(!schema.validate(&json!({"price": 0}), &options).unwrap().is_valid());
}

#[test]
fn test_fetcher_is_called_once_per_document() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let fetcher = move |uri: &Url| -> schemata_core::Result<Value> {
        counter.fetch_add(1, Ordering::SeqCst);
        match uri.as_str() {
            "https://example.com/name.json" => Ok(json!({"type": "string", "minLength": 1})),
            other => Err(Error::fetch(other, "not found")),
        }
    };
    let options = hierarchical().with_fetcher(Arc::new(fetcher));

    let schema = JsonSchema::from_value(json!({
        "properties": {
            "first": {"$ref": "https://example.com/name.json"},
            "last": {"$ref": "https://example.com/name.json"}
        }
    }))
    .unwrap();
    let results = schema
        .validate(&json!({"first": "Ada", "last": "Lovelace"}), &options)
        .unwrap();
    assert!(results.is_valid());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unresolvable_reference_fails_validation() {
    let fetcher = |uri: &Url| -> schemata_core::Result<Value> { Err(Error::fetch(uri.as_str(), "offline")) };
    let options = hierarchical().with_fetcher(Arc::new(fetcher));

    let schema = JsonSchema::from_value(json!({"$ref": "https://example.com/missing.json"})).unwrap();
    let results = schema.validate(&json!(1), &options).unwrap();
    assert!(!results.is_valid());

    let anchored = JsonSchema::from_value(json!({"$ref": "#nowhere"})).unwrap();
    assert!(!anchored.validate(&json!(1), &hierarchical()).unwrap().is_valid());
}

#[test]
fn test_anchor_and_pointer_references() {
    let schema = JsonSchema::from_value(json!({
        "$id": "https://example.com/root",
        "properties": {
            "a": {"$ref": "#word"},
            "b": {"$ref": "#/$defs/number"},
            "c": {"$ref": "#/$defs/with%25percent"}
        },
        "$defs": {
            "word": {"$anchor": "word", "type": "string"},
            "number": {"type": "number"},
            "with%percent": {"type": "boolean"}
        }
    }))
    .unwrap();

    assert!(schema
        .validate(&json!({"a": "x", "b": 1, "c": true}), &hierarchical())
        .unwrap()
        .is_valid());
    assert!(!schema.validate(&json!({"a": 1}), &hierarchical()).unwrap().is_valid());
    assert!(!schema.validate(&json!({"b": "1"}), &hierarchical()).unwrap().is_valid());
    assert!(!schema.validate(&json!({"c": 0}), &hierarchical()).unwrap().is_valid());
}

#[test]
fn test_reference_cycle_hits_traversal_limit() {
    let schema = JsonSchema::from_value(json!({
        "$defs": {
            "a": {"$ref": "#/$defs/b"},
            "b": {"$ref": "#/$defs/a"}
        },
        "$ref": "#/$defs/a"
    }))
    .unwrap();
    let options = hierarchical().with_max_traversal_depth(16);

    let err = schema.validate(&json!(1), &options).unwrap_err();
    assert!(matches!(err, Error::TraversalLimitExceeded { limit: 16, .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_large_traversal_limit_is_reported_not_overflowed() {
    let schema = JsonSchema::from_value(json!({"$ref": "#"})).unwrap();
    for limit in [500, 2_000, 4_000] {
        let options = ValidationOptions::default().with_max_traversal_depth(limit);
        let err = schema.validate(&json!({}), &options).unwrap_err();
        assert!(matches!(err, Error::TraversalLimitExceeded { limit: l, .. } if l == limit));
    }
}

#[test]
fn test_deep_instance_within_limit() {
    let schema = JsonSchema::from_value(json!({
        "type": "object",
        "properties": {"next": {"$ref": "#"}}
    }))
    .unwrap();
    let mut instance = json!({});
    for _ in 0..600 {
        instance = json!({"next": instance});
    }
    let options = ValidationOptions::default().with_max_traversal_depth(5_000);
    assert!(schema.validate(&instance, &options).unwrap().is_valid());

    let shallow = ValidationOptions::default().with_max_traversal_depth(100);
    assert!(schema.validate(&instance, &shallow).unwrap_err().is_fatal());
}

#[test]
fn test_draft7_ref_ignores_siblings() {
    let schema = JsonSchema::from_value(json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": {"any": {}},
        "properties": {
            "x": {"$ref": "#/definitions/any", "type": "string"}
        }
    }))
    .unwrap();
    assert!(schema.validate(&json!({"x": 5}), &hierarchical()).unwrap().is_valid());

    let modern = JsonSchema::from_value(json!({
        "$defs": {"any": {}},
        "properties": {
            "x": {"$ref": "#/$defs/any", "type": "string"}
        }
    }))
    .unwrap();
    assert!(!modern.validate(&json!({"x": 5}), &hierarchical()).unwrap().is_valid());
}
