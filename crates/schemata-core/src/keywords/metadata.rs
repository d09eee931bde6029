//! Annotation keywords and `format`
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use super::{expect_string, Keyword};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::schema::ParseContext;
use serde_json::{Map, Value};

/// Annotates the keyword's value unchanged
#[derive(Debug)]
pub struct Annotation {
    value: Value,
}

impl Keyword for Annotation {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        ctx.annotate(self.value.clone());
        Ok(())
    }
}

pub fn parse_annotation(value: &Value, _: &Map<String, Value>, _ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(Annotation { value: value.clone() }))
}

/// Keywords missing from the catalog annotate their raw value
pub fn parse_unrecognized(value: &Value, siblings: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    parse_annotation(value, siblings, ctx)
}

/// `contentSchema`: parsed so it can be referenced, otherwise an annotation
pub fn parse_content_schema(value: &Value, siblings: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    ctx.subschema(value, &[])?;
    parse_annotation(value, siblings, ctx)
}

/// `format`: always annotates its name and asserts when the options or the
/// active vocabularies ask for it
#[derive(Debug)]
pub struct FormatKeyword {
    name: String,
}

impl Keyword for FormatKeyword {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        ctx.annotate(Value::String(self.name.clone()));

        let options = ctx.options();
        let format = options.formats.resolve(&self.name);
        if !format.is_known() {
            if options.only_known_formats {
                let message = ctx.message("unknownFormat", &[("format", self.name.clone())]);
                ctx.fail(message);
            }
            return Ok(());
        }
        if !ctx.format_asserts() {
            return Ok(());
        }

        match format.validate(ctx.instance()) {
            Ok(()) => {}
            Err(None) => {
                let message = ctx.message("format", &[("format", self.name.clone())]);
                ctx.fail(message);
            }
            Err(Some(detail)) => {
                let message = ctx.message("formatDetail", &[("format", self.name.clone()), ("detail", detail)]);
                ctx.fail(message);
            }
        }
        Ok(())
    }
}

pub fn parse_format(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(FormatKeyword {
        name: expect_string(value, ctx)?.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::formats::{FormatRegistry, RegexFormat};
    use crate::{JsonSchema, OutputFormat, ValidationOptions};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_format_annotates_by_default() {
        let schema = JsonSchema::from_value(json!({"format": "email"})).unwrap();
        let options = ValidationOptions::default().with_output_format(OutputFormat::Hierarchical);
        let results = schema.validate(&json!("not an email"), &options).unwrap();
        assert!(results.is_valid());
        assert_eq!(results.root().annotation("format"), Some(&json!("email")));
    }

    #[test]
    fn test_format_asserts_when_required() {
        let schema = JsonSchema::from_value(json!({"format": "ipv4"})).unwrap();
        let options = ValidationOptions::default().with_format_validation(true);
        assert!(!schema.validate(&json!("300.1.1.1"), &options).unwrap().is_valid());
        assert!(schema.validate(&json!("10.0.0.1"), &options).unwrap().is_valid());
        assert!(schema.validate(&json!(12), &options).unwrap().is_valid());
    }

    #[test]
    fn test_only_known_formats() {
        let schema = JsonSchema::from_value(json!({"format": "made-up"})).unwrap();
        let lenient = ValidationOptions::default();
        assert!(schema.validate(&json!("x"), &lenient).unwrap().is_valid());
        let strict = ValidationOptions::default().with_only_known_formats(true);
        assert!(!schema.validate(&json!("x"), &strict).unwrap().is_valid());
    }

    #[test]
    fn test_custom_format() {
        let mut formats = FormatRegistry::standard();
        formats.register(RegexFormat::new("hexadecimal", "^[0-9a-fA-F]+$").unwrap());
        let options = ValidationOptions::default()
            .with_formats(Arc::new(formats))
            .with_format_validation(true);
        let schema = JsonSchema::from_value(json!({"format": "hexadecimal"})).unwrap();
        assert!(schema.validate(&json!("00ff"), &options).unwrap().is_valid());
        assert!(!schema.validate(&json!("zz"), &options).unwrap().is_valid());
    }

    #[test]
    fn test_unrecognized_keywords_annotate() {
        let schema = JsonSchema::from_value(json!({"x-note": {"n": 1}, "title": "T"})).unwrap();
        let options = ValidationOptions::default().with_output_format(OutputFormat::Hierarchical);
        let results = schema.validate(&json!(null), &options).unwrap();
        assert_eq!(results.root().annotation("x-note"), Some(&json!({"n": 1})));
        assert_eq!(results.root().annotation("title"), Some(&json!("T")));
    }
}
