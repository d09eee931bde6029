//! Built-in keyword table for drafts 6, 7, 2019-09 and 2020-12

use super::KeywordSpec;
use crate::draft::{Draft, DraftSet};
use crate::keywords::{applicator, core, data, metadata, unevaluated, validation};
use crate::vocabulary::uris::*;

const ALL: DraftSet = DraftSet::ALL;
const SINCE_7: DraftSet = DraftSet::since(Draft::Draft7);
const SINCE_2019: DraftSet = DraftSet::since(Draft::Draft201909);
const ONLY_2019: DraftSet = DraftSet::of(&[Draft::Draft201909]);
const ONLY_2020: DraftSet = DraftSet::of(&[Draft::Draft202012]);
const UNTIL_7: DraftSet = DraftSet::until(Draft::Draft7);
const UNTIL_2019: DraftSet = DraftSet::until(Draft::Draft201909);

const CORE: &[&str] = &[CORE_2019_09, CORE_2020_12];
const APPLICATOR: &[&str] = &[APPLICATOR_2019_09, APPLICATOR_2020_12];
const UNEVALUATED: &[&str] = &[APPLICATOR_2019_09, UNEVALUATED_2020_12];
const VALIDATION: &[&str] = &[VALIDATION_2019_09, VALIDATION_2020_12];
const META_DATA: &[&str] = &[META_DATA_2019_09, META_DATA_2020_12];
const FORMAT: &[&str] = &[FORMAT_2019_09, FORMAT_ANNOTATION_2020_12, FORMAT_ASSERTION_2020_12];
const CONTENT: &[&str] = &[CONTENT_2019_09, CONTENT_2020_12];

pub(super) fn specs() -> Vec<KeywordSpec> {
    vec![
        // core
        KeywordSpec::new("$schema", ALL, core::parse_schema_uri).vocabularies(CORE).annotation_only(),
        KeywordSpec::new("$id", ALL, core::parse_id).vocabularies(CORE).annotation_only(),
        KeywordSpec::new("$anchor", SINCE_2019, core::parse_anchor).vocabularies(CORE).annotation_only(),
        KeywordSpec::new("$dynamicAnchor", ONLY_2020, core::parse_anchor).vocabularies(CORE).annotation_only(),
        KeywordSpec::new("$recursiveAnchor", ONLY_2019, core::parse_recursive_anchor)
            .vocabularies(CORE)
            .annotation_only(),
        KeywordSpec::new("$vocabulary", SINCE_2019, core::parse_vocabulary).vocabularies(CORE).annotation_only(),
        KeywordSpec::new("$comment", SINCE_7, core::parse_comment).vocabularies(CORE).annotation_only(),
        KeywordSpec::new("$defs", SINCE_2019, core::parse_definitions).vocabularies(CORE).annotation_only(),
        KeywordSpec::new("definitions", UNTIL_7, core::parse_definitions).annotation_only(),
        KeywordSpec::new("$ref", ALL, core::parse_ref).vocabularies(CORE),
        KeywordSpec::new("$recursiveRef", ONLY_2019, core::parse_recursive_ref).vocabularies(CORE),
        KeywordSpec::new("$dynamicRef", ONLY_2020, core::parse_dynamic_ref).vocabularies(CORE),
        // applicators
        KeywordSpec::new("allOf", ALL, applicator::parse_all_of).vocabularies(APPLICATOR),
        KeywordSpec::new("anyOf", ALL, applicator::parse_any_of).vocabularies(APPLICATOR),
        KeywordSpec::new("oneOf", ALL, applicator::parse_one_of).vocabularies(APPLICATOR),
        KeywordSpec::new("not", ALL, applicator::parse_not).vocabularies(APPLICATOR),
        KeywordSpec::new("if", SINCE_7, applicator::parse_if).vocabularies(APPLICATOR).annotation_only(),
        KeywordSpec::new("then", SINCE_7, applicator::parse_then)
            .vocabularies(APPLICATOR)
            .depends_on(&["if"]),
        KeywordSpec::new("else", SINCE_7, applicator::parse_else)
            .vocabularies(APPLICATOR)
            .depends_on(&["if"]),
        KeywordSpec::new("dependentSchemas", SINCE_2019, applicator::parse_dependent_schemas)
            .vocabularies(APPLICATOR),
        KeywordSpec::new("dependencies", UNTIL_7, applicator::parse_dependencies),
        KeywordSpec::new("properties", ALL, applicator::parse_properties).vocabularies(APPLICATOR),
        KeywordSpec::new("patternProperties", ALL, applicator::parse_pattern_properties)
            .vocabularies(APPLICATOR),
        KeywordSpec::new("additionalProperties", ALL, applicator::parse_additional_properties)
            .vocabularies(APPLICATOR)
            .depends_on(&["properties", "patternProperties"]),
        KeywordSpec::new("propertyNames", ALL, applicator::parse_property_names).vocabularies(APPLICATOR),
        KeywordSpec::new("prefixItems", ONLY_2020, applicator::parse_prefix_items).vocabularies(APPLICATOR),
        KeywordSpec::new("items", ALL, applicator::parse_items)
            .vocabularies(APPLICATOR)
            .depends_on(&["prefixItems"]),
        KeywordSpec::new("additionalItems", UNTIL_2019, applicator::parse_additional_items)
            .vocabularies(APPLICATOR)
            .depends_on(&["items"]),
        KeywordSpec::new("contains", ALL, applicator::parse_contains).vocabularies(APPLICATOR),
        // unevaluated
        KeywordSpec::new("unevaluatedProperties", SINCE_2019, unevaluated::parse_unevaluated_properties)
            .vocabularies(UNEVALUATED)
            .depends_on(&[
                "properties",
                "patternProperties",
                "additionalProperties",
                "unevaluatedProperties",
            ]),
        KeywordSpec::new("unevaluatedItems", SINCE_2019, unevaluated::parse_unevaluated_items)
            .vocabularies(UNEVALUATED)
            .depends_on(&[
                "prefixItems",
                "items",
                "additionalItems",
                "contains",
                "unevaluatedItems",
            ]),
        // validation
        KeywordSpec::new("type", ALL, validation::parse_type).vocabularies(VALIDATION),
        KeywordSpec::new("enum", ALL, validation::parse_enum).vocabularies(VALIDATION),
        KeywordSpec::new("const", ALL, validation::parse_const).vocabularies(VALIDATION),
        KeywordSpec::new("multipleOf", ALL, validation::parse_multiple_of).vocabularies(VALIDATION),
        KeywordSpec::new("maximum", ALL, validation::parse_maximum).vocabularies(VALIDATION),
        KeywordSpec::new("exclusiveMaximum", ALL, validation::parse_exclusive_maximum)
            .vocabularies(VALIDATION),
        KeywordSpec::new("minimum", ALL, validation::parse_minimum).vocabularies(VALIDATION),
        KeywordSpec::new("exclusiveMinimum", ALL, validation::parse_exclusive_minimum)
            .vocabularies(VALIDATION),
        KeywordSpec::new("maxLength", ALL, validation::parse_max_length).vocabularies(VALIDATION),
        KeywordSpec::new("minLength", ALL, validation::parse_min_length).vocabularies(VALIDATION),
        KeywordSpec::new("pattern", ALL, validation::parse_pattern).vocabularies(VALIDATION),
        KeywordSpec::new("maxItems", ALL, validation::parse_max_items).vocabularies(VALIDATION),
        KeywordSpec::new("minItems", ALL, validation::parse_min_items).vocabularies(VALIDATION),
        KeywordSpec::new("uniqueItems", ALL, validation::parse_unique_items).vocabularies(VALIDATION),
        KeywordSpec::new("maxContains", SINCE_2019, validation::parse_max_contains)
            .vocabularies(VALIDATION)
            .depends_on(&["contains"]),
        KeywordSpec::new("minContains", SINCE_2019, validation::parse_min_contains)
            .vocabularies(VALIDATION)
            .depends_on(&["contains"]),
        KeywordSpec::new("maxProperties", ALL, validation::parse_max_properties).vocabularies(VALIDATION),
        KeywordSpec::new("minProperties", ALL, validation::parse_min_properties).vocabularies(VALIDATION),
        KeywordSpec::new("required", ALL, validation::parse_required).vocabularies(VALIDATION),
        KeywordSpec::new("dependentRequired", SINCE_2019, validation::parse_dependent_required)
            .vocabularies(VALIDATION),
        // meta-data
        KeywordSpec::new("title", ALL, metadata::parse_annotation).vocabularies(META_DATA).annotation_only(),
        KeywordSpec::new("description", ALL, metadata::parse_annotation)
            .vocabularies(META_DATA)
            .annotation_only(),
        KeywordSpec::new("default", ALL, metadata::parse_annotation).vocabularies(META_DATA).annotation_only(),
        KeywordSpec::new("examples", ALL, metadata::parse_annotation).vocabularies(META_DATA).annotation_only(),
        KeywordSpec::new("readOnly", SINCE_7, metadata::parse_annotation)
            .vocabularies(META_DATA)
            .annotation_only(),
        KeywordSpec::new("writeOnly", SINCE_7, metadata::parse_annotation)
            .vocabularies(META_DATA)
            .annotation_only(),
        KeywordSpec::new("deprecated", SINCE_2019, metadata::parse_annotation)
            .vocabularies(META_DATA)
            .annotation_only(),
        // format and content
        KeywordSpec::new("format", ALL, metadata::parse_format).vocabularies(FORMAT),
        KeywordSpec::new("contentMediaType", SINCE_7, metadata::parse_annotation)
            .vocabularies(CONTENT)
            .annotation_only(),
        KeywordSpec::new("contentEncoding", SINCE_7, metadata::parse_annotation)
            .vocabularies(CONTENT)
            .annotation_only(),
        KeywordSpec::new("contentSchema", SINCE_2019, metadata::parse_content_schema)
            .vocabularies(CONTENT)
            .annotation_only(),
        // data references
        KeywordSpec::new("data", SINCE_2019, data::parse_data).vocabularies(&[DATA]),
    ]
}
