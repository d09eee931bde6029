//! Integration tests for keyword evaluation
//!
//! These tests drive the public API end to end: parsing, evaluation and the
//! output projections.

use proptest::prelude::*;
use schemata_core::formats::{FormatRegistry, RegexFormat};
use schemata_core::{meta, Draft, JsonSchema, KeywordCatalog, OutputFormat, ValidationOptions};
use serde_json::{json, Value};
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

fn hierarchical() -> ValidationOptions {
    ValidationOptions::default().with_output_format(OutputFormat::Hierarchical)
}

fn flag_valid(schema: Value, instance: Value) -> bool {
    JsonSchema::from_value(schema)
        .unwrap()
        .validate(&instance, &ValidationOptions::default())
        .unwrap()
        .is_valid()
}

fn is_valid(schema: Value, instance: Value) -> bool {
    JsonSchema::from_value(schema)
        .unwrap()
        .validate(&instance, &hierarchical())
        .unwrap()
        .is_valid()
}

#[test]
fn test_unevaluated_properties_names_the_extra_property() {
    let schema = JsonSchema::from_value(json!({
        "type": "object",
        "properties": {"a": {}},
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.validate(&json!({"a": 1}), &hierarchical()).unwrap().is_valid());

    let results = schema.validate(&json!({"a": 1, "b": 2}), &hierarchical()).unwrap();
    assert!(!results.is_valid());
    let output = results.to_output();
    let errors = output.errors.expect("root unit carries keyword errors");
    assert!(errors["unevaluatedProperties"].contains("\"b\""));
    assert!(!errors["unevaluatedProperties"].contains("\"a\""));
}

#[test]
fn test_unevaluated_properties_does_not_name_failed_properties() {
    let schema = JsonSchema::from_value(json!({
        "properties": {"a": {"type": "string"}},
        "unevaluatedProperties": false
    }))
    .unwrap();
    let output = schema.validate(&json!({"a": 1, "b": 2}), &hierarchical()).unwrap().to_output();
    let errors = output.errors.expect("root unit carries keyword errors");
    assert!(errors["unevaluatedProperties"].contains("\"b\""));
    assert!(!errors["unevaluatedProperties"].contains("\"a\""));
    assert!(errors["properties"].contains("\"a\""));
}

#[test]
fn test_any_of_branches_all_annotate_with_default_options() {
    let schema = json!({
        "anyOf": [
            {"properties": {"a": true}},
            {"properties": {"b": true}}
        ],
        "unevaluatedProperties": false
    });
    assert!(flag_valid(schema.clone(), json!({"a": 1, "b": 1})));
    assert!(!flag_valid(schema.clone(), json!({"a": 1, "b": 1, "c": 1})));
    assert!(is_valid(schema, json!({"a": 1, "b": 1})));

    let nested = json!({
        "allOf": [{"anyOf": [{"properties": {"a": true}}, {"properties": {"b": true}}]}],
        "unevaluatedProperties": false
    });
    assert!(flag_valid(nested, json!({"a": 1, "b": 1})));

    let items = json!({
        "anyOf": [{"prefixItems": [true]}, {"prefixItems": [true, true]}],
        "unevaluatedItems": false
    });
    assert!(flag_valid(items.clone(), json!([1, 2])));
    assert!(!flag_valid(items, json!([1, 2, 3])));
}

#[test]
fn test_one_of_annotations_with_default_options() {
    let schema = json!({
        "oneOf": [
            {"properties": {"a": true}, "required": ["a"]},
            {"properties": {"b": true}, "required": ["b"]}
        ],
        "unevaluatedProperties": false
    });
    assert!(flag_valid(schema.clone(), json!({"a": 1})));
    assert!(flag_valid(schema.clone(), json!({"b": 1})));
    assert!(!flag_valid(schema.clone(), json!({"a": 1, "b": 1})));
    assert!(!flag_valid(schema, json!({"a": 1, "c": 1})));
}

#[test]
fn test_short_circuit_records_skipped_keywords() {
    let schema = JsonSchema::from_value(json!({"minimum": 10, "multipleOf": 5})).unwrap();

    let results = schema.validate(&json!(3), &ValidationOptions::default()).unwrap();
    assert!(!results.is_valid());
    let keywords = &results.root().children;
    assert_eq!(keywords.len(), 2);
    let skipped: Vec<_> = keywords.iter().filter(|k| k.skipped).collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].valid);
    assert!(skipped[0].errors.is_empty());
    assert!(keywords.iter().any(|k| !k.skipped && !k.valid));

    let errors = results.to_output_as(OutputFormat::Hierarchical).errors.unwrap();
    assert_eq!(errors.len(), 1);

    let full = schema.validate(&json!(3), &hierarchical()).unwrap();
    assert!(full.root().children.iter().all(|k| !k.skipped && !k.valid));
}

#[test]
fn test_boolean_schemas() {
    let instances = [
        json!(null),
        json!(true),
        json!(0),
        json!(1.5),
        json!("text"),
        json!([1, 2]),
        json!({"a": 1}),
    ];
    let accept = JsonSchema::from_value(json!(true)).unwrap();
    let reject = JsonSchema::from_value(json!(false)).unwrap();

    for instance in &instances {
        let passed = accept.validate(instance, &hierarchical()).unwrap();
        assert!(passed.is_valid());
        assert!(passed.root().annotations.is_empty());

        let failed = reject.validate(instance, &hierarchical()).unwrap();
        assert!(!failed.is_valid());
        assert!(failed.root().annotations.is_empty());
        assert!(!failed.root().errors.is_empty());
    }
}

#[test]
fn test_output_formats_agree_on_validity() {
    let schema = JsonSchema::from_value(json!({
        "properties": {
            "name": {"type": "string", "minLength": 2},
            "tags": {"type": "array", "items": {"type": "string"}, "uniqueItems": true}
        },
        "required": ["name"]
    }))
    .unwrap();
    let instances = [
        json!({"name": "ok", "tags": ["a", "b"]}),
        json!({"name": "x"}),
        json!({"tags": ["a", "a"]}),
    ];
    for instance in &instances {
        let verdicts: Vec<bool> = [
            OutputFormat::Flag,
            OutputFormat::Basic,
            OutputFormat::Detailed,
            OutputFormat::Hierarchical,
        ]
        .into_iter()
        .map(|format| {
            let options = ValidationOptions::default().with_output_format(format);
            schema.validate(instance, &options).unwrap().is_valid()
        })
        .collect();
        assert!(verdicts.windows(2).all(|pair| pair[0] == pair[1]), "{:?}", verdicts);
    }
}

#[test]
fn test_basic_output_lists_failing_units() {
    let schema = JsonSchema::from_value(json!({
        "properties": {"age": {"type": "integer", "minimum": 0}}
    }))
    .unwrap();
    let options = ValidationOptions::default().with_output_format(OutputFormat::Basic);
    let output = schema.validate(&json!({"age": -3}), &options).unwrap().to_output();
    assert!(!output.valid);
    assert!(output.details.iter().all(|unit| unit.details.is_empty()));
    assert!(output
        .details
        .iter()
        .any(|unit| unit.instance_location == "/age" && unit.errors.is_some()));

    let serialized = serde_json::to_value(&output).unwrap();
    assert_eq!(serialized["valid"], json!(false));
    assert!(serialized.get("instanceLocation").is_some());
}

#[test]
fn test_hexadecimal_format_scenario() {
    let mut formats = FormatRegistry::standard();
    formats.register(RegexFormat::new("hexadecimal", "^[0-9a-fA-F]+$").unwrap());
    let schema = JsonSchema::from_value(json!({"format": "hexadecimal"})).unwrap();
    let options = ValidationOptions::default()
        .with_formats(Arc::new(formats))
        .with_format_validation(true);

    let check = |instance: Value| schema.validate(&instance, &options).unwrap().is_valid();
    assert!(check(json!("1dd7fe33f97f42cf89c5789018bae64d")));
    assert!(!check(json!("nwvoiwe;oiabe23oi32")));
    assert!(check(json!(true)));
}

#[test]
fn test_custom_hexadecimal_format() {
    let mut formats = FormatRegistry::standard();
    formats.register(RegexFormat::new("hexadecimal", "^[0-9a-fA-F]+$").unwrap());
    let schema = JsonSchema::from_value(json!({
        "type": "object",
        "properties": {"color": {"format": "hexadecimal"}}
    }))
    .unwrap();

    let asserting = ValidationOptions::default()
        .with_formats(Arc::new(formats))
        .with_format_validation(true);
    assert!(schema.validate(&json!({"color": "C0FFEE"}), &asserting).unwrap().is_valid());
    assert!(!schema.validate(&json!({"color": "coffee"}), &asserting).unwrap().is_valid());

    // Annotation-only by default, even for a registered format
    assert!(schema.validate(&json!({"color": "coffee"}), &hierarchical()).unwrap().is_valid());
}

#[test]
fn test_meta_schema_rejects_malformed_schema() {
    let meta = meta::for_draft(Draft::Draft202012).unwrap();
    assert!(!meta.validate(&json!({"type": 12}), &hierarchical()).unwrap().is_valid());
    assert!(meta
        .validate(&json!({"type": "string", "minLength": 1}), &hierarchical())
        .unwrap()
        .is_valid());

    let draft7 = meta::for_draft(Draft::Draft7).unwrap();
    assert!(!draft7.validate(&json!({"minLength": -1}), &hierarchical()).unwrap().is_valid());
    assert!(draft7
        .validate(&json!({"properties": {"a": {"type": "integer"}}}), &hierarchical())
        .unwrap()
        .is_valid());
}

#[test]
fn test_validate_as_overrides_declared_draft() {
    let schema = JsonSchema::from_value(json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "prefixItems": [{"type": "string"}]
    }))
    .unwrap();

    // prefixItems is unknown to draft-07 and only annotates there
    assert!(schema.validate(&json!([1]), &hierarchical()).unwrap().is_valid());

    let forced = hierarchical().with_validate_as(Draft::Draft202012);
    assert!(!schema.validate(&json!([1]), &forced).unwrap().is_valid());
}

#[test]
fn test_standard_catalog_ordering() {
    let catalog = KeywordCatalog::standard();
    let priority = |name: &str| catalog.get(name).unwrap().priority();

    assert!(priority("$schema") < priority("$id"));
    assert!(priority("$id") < priority("properties"));
    assert!(priority("properties") < priority("additionalProperties"));
    assert!(priority("prefixItems") < priority("items"));
    assert!(priority("if") < priority("then"));
    assert!(priority("contains") < priority("minContains"));
    assert!(priority("additionalProperties") < priority("unevaluatedProperties"));
    assert_eq!(priority("unevaluatedItems"), i64::MAX);
    assert!(catalog.get("properties").unwrap().produces_dependent_annotations());
}

#[test]
fn test_conditional_keywords() {
    let schema = json!({
        "if": {"minimum": 10},
        "then": {"multipleOf": 5},
        "else": {"maximum": 3}
    });
    assert!(is_valid(schema.clone(), json!(15)));
    assert!(!is_valid(schema.clone(), json!(12)));
    assert!(is_valid(schema.clone(), json!(2)));
    assert!(!is_valid(schema, json!(5)));
}

#[test]
fn test_schema_from_file() {
    let mut file = tempfile::tempfile().unwrap();
    write!(file, r#"{{"type": "array", "items": {{"type": "number"}}, "maxItems": 2}}"#).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let schema = JsonSchema::from_reader(&file).unwrap();
    assert!(schema.validate(&json!([1, 2.5]), &hierarchical()).unwrap().is_valid());
    assert!(!schema.validate(&json!([1, 2, 3]), &hierarchical()).unwrap().is_valid());
    assert!(!schema.validate(&json!(["1"]), &hierarchical()).unwrap().is_valid());
}

proptest! {
    #[test]
    fn prop_range_validity_matches_bounds(n in -1000i64..1000) {
        let schema = JsonSchema::from_value(json!({
            "type": "integer",
            "minimum": -10,
            "exclusiveMaximum": 10
        }))
        .unwrap();
        let results = schema.validate(&json!(n), &hierarchical()).unwrap();
        prop_assert_eq!(results.is_valid(), (-10..10).contains(&n));
    }

    #[test]
    fn prop_hierarchical_matches_flag(items in proptest::collection::vec(0u8..4, 0..6)) {
        let schema = JsonSchema::from_value(json!({
            "type": "array",
            "prefixItems": [{"const": 0}],
            "contains": {"const": 3},
            "maxContains": 1,
            "unevaluatedItems": {"maximum": 2}
        }))
        .unwrap();
        let instance = json!(items);
        let flag = schema.validate(&instance, &ValidationOptions::default()).unwrap();
        let full = schema.validate(&instance, &hierarchical()).unwrap();
        prop_assert_eq!(flag.is_valid(), full.is_valid());
        prop_assert_eq!(full.to_output().valid, full.is_valid());
    }

    #[test]
    fn prop_in_place_applicators_agree_across_formats(
        schema in prop::sample::select(in_place_schemas()),
        object in prop::collection::btree_map(prop::sample::select(vec!["a", "b", "c", "d"]), 0i64..3, 0..4)
    ) {
        let schema = JsonSchema::from_value(schema).unwrap();
        let instance = json!(object);
        let flag = schema.validate(&instance, &ValidationOptions::default()).unwrap();
        let full = schema.validate(&instance, &hierarchical()).unwrap();
        prop_assert_eq!(flag.is_valid(), full.is_valid());
    }
}

fn in_place_schemas() -> Vec<Value> {
    vec![
        json!({
            "allOf": [{"anyOf": [{"properties": {"a": {"maximum": 1}}}, {"properties": {"b": {"minimum": 1}}}]}],
            "properties": {"c": {"type": "integer"}},
            "unevaluatedProperties": false
        }),
        json!({
            "anyOf": [{"properties": {"a": true}, "required": ["a"]}, {"properties": {"b": {"minimum": 1}}}],
            "unevaluatedProperties": {"maximum": 1}
        }),
        json!({
            "oneOf": [{"properties": {"a": {"minimum": 1}}}, {"properties": {"b": true}, "required": ["b"]}],
            "unevaluatedProperties": false
        }),
        json!({
            "allOf": [
                {"properties": {"a": true}},
                {"anyOf": [{"properties": {"b": true}}, {"properties": {"c": true}}]}
            ],
            "unevaluatedProperties": false
        }),
    ]
}
