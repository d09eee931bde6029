//! Error message templates
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! Messages use `[[token]]` placeholders. Callers may replace any template
//! through [`crate::ValidationOptions::messages`], keyed by the names below.

use std::collections::HashMap;

/// Built-in template for `key`
pub fn default_template(key: &str) -> Option<&'static str> {
    let template = match key {
        "falseSchema" => "All values fail against the false schema",
        "unknownVocabulary" => "Required vocabularies are not supported: [[vocabularies]]",
        "unresolvedReference" => "Could not resolve '[[reference]]': [[reason]]",
        "type" => "Value is [[received]] but should be [[expected]]",
        "enum" => "Value should match one of the values specified by the enum",
        "const" => "Expected [[value]]",
        "multipleOf" => "[[received]] is not a multiple of [[divisor]]",
        "maximum" => "[[received]] is greater than [[limit]]",
        "exclusiveMaximum" => "[[received]] is greater than or equal to [[limit]]",
        "minimum" => "[[received]] is less than [[limit]]",
        "exclusiveMinimum" => "[[received]] is less than or equal to [[limit]]",
        "maxLength" => "Value is not shorter than or equal to [[limit]] characters",
        "minLength" => "Value is not longer than or equal to [[limit]] characters",
        "pattern" => "The string value is not a match for the indicated regular expression [[pattern]]",
        "maxItems" => "Value has more than [[limit]] items",
        "minItems" => "Value has fewer than [[limit]] items",
        "uniqueItems" => "Found duplicates at the following index pairs: [[duplicates]]",
        "contains" => "No items match the contains schema",
        "maxContains" => "Value has more than [[limit]] items that matched the schema provided by the contains keyword",
        "minContains" => "Value has fewer than [[limit]] items that matched the schema provided by the contains keyword",
        "maxProperties" => "Value has more than [[limit]] properties",
        "minProperties" => "Value has fewer than [[limit]] properties",
        "required" => "Required properties [[missing]] are not present",
        "dependentRequired" => "Some required property dependencies are missing: [[missing]]",
        "dependentSchemas" => "The following properties failed their dependent schemas: [[failed]]",
        "anyOf" => "Value does not match any of the [[count]] subschemas",
        "oneOf" => "Expected 1 matching subschema but found [[count]]",
        "not" => "Value should not validate against the schema",
        "properties" => "Properties [[properties]] failed validation",
        "additionalProperties" => "Additional properties [[properties]] failed validation",
        "unevaluatedProperties" => "Unevaluated properties [[properties]] failed validation",
        "propertyNames" => "Property names [[properties]] failed validation",
        "items" => "Items at indices [[indices]] failed validation",
        "unevaluatedItems" => "Unevaluated items at indices [[indices]] failed validation",
        "format" => "Value does not match format \"[[format]]\"",
        "formatDetail" => "Value does not match format \"[[format]]\": [[detail]]",
        "unknownFormat" => "Cannot validate for format \"[[format]]\"",
        "data" => "Unable to resolve data references: [[references]]",
        _ => return None,
    };
    Some(template)
}

/// Substitute `[[token]]` placeholders
pub fn render(template: &str, tokens: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in tokens {
        out = out.replace(&format!("[[{}]]", name), value);
    }
    out
}

/// Resolve a template, preferring an override, and render it
pub(crate) fn format_message(
    overrides: &HashMap<String, String>,
    key: &str,
    tokens: &[(&str, String)],
) -> String {
    match overrides.get(key).map(String::as_str).or_else(|| default_template(key)) {
        Some(template) => render(template, tokens),
        None => key.to_string(),
    }
}
