//! Core keywords: identification, anchors and references
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use super::{expect_bool, expect_object, expect_string, Inert, Keyword};
use crate::context::EvaluationContext;
use crate::error::{Error, Result};
use crate::resolver::ReferenceKind;
use crate::schema::ParseContext;
use serde_json::{Map, Value};
use url::Url;

/// `$schema`; the parser has already switched drafts
pub fn parse_schema_uri(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let uri = expect_string(value, ctx)?;
    Url::parse(uri).map_err(|e| ctx.error(format!("Invalid meta-schema URI '{}': {}", uri, e)))?;
    Ok(Box::new(Inert))
}

/// `$id`; resource boundaries are tracked by the parser
pub fn parse_id(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    expect_string(value, ctx)?;
    Ok(Box::new(Inert))
}

/// `$anchor` and `$dynamicAnchor`
pub fn parse_anchor(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let name = expect_string(value, ctx)?;
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ctx.error(format!("Invalid anchor name '{}'", name)));
    }
    Ok(Box::new(Inert))
}

pub fn parse_recursive_anchor(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    expect_bool(value, ctx)?;
    Ok(Box::new(Inert))
}

pub fn parse_vocabulary(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let declared = expect_object(value, ctx)?;
    if let Some((uri, _)) = declared.iter().find(|(_, required)| !required.is_boolean()) {
        return Err(ctx.error(format!("Vocabulary '{}' must map to a boolean", uri)));
    }
    Ok(Box::new(Inert))
}

pub fn parse_comment(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    expect_string(value, ctx)?;
    Ok(Box::new(Inert))
}

/// `$defs` and `definitions`: parsed so references can reach them
pub fn parse_definitions(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    super::schema_map(value, ctx)?;
    Ok(Box::new(Inert))
}

/// `$ref`, `$recursiveRef` and `$dynamicRef`.
///
/// The reference is joined with the base URI at parse time; the target is
/// looked up when the keyword is evaluated.
#[derive(Debug)]
pub struct RefKeyword {
    reference: String,
    target: Url,
    kind: ReferenceKind,
}

impl RefKeyword {
    fn parse(value: &Value, ctx: &ParseContext<'_>, kind: ReferenceKind) -> Result<Self> {
        let reference = expect_string(value, ctx)?;
        let target = ctx
            .base_uri()
            .join(reference)
            .map_err(|e| ctx.error(format!("Invalid reference '{}': {}", reference, e)))?;
        Ok(Self {
            reference: reference.to_string(),
            target,
            kind,
        })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }
}

impl Keyword for RefKeyword {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        let node = match ctx.resolve_reference(self.kind, &self.target) {
            Ok(node) => node,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                let reason = match e {
                    Error::UnresolvedReference { reason, .. } => reason,
                    other => other.to_string(),
                };
                let message = ctx.message(
                    "unresolvedReference",
                    &[("reference", self.reference.clone()), ("reason", reason)],
                );
                ctx.fail(message);
                return Ok(());
            }
        };
        if !ctx.evaluate_in_place(&node, &[], true)? {
            ctx.invalidate();
        }
        Ok(())
    }
}

pub fn parse_ref(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(RefKeyword::parse(value, ctx, ReferenceKind::Static)?))
}

pub fn parse_recursive_ref(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(RefKeyword::parse(value, ctx, ReferenceKind::Recursive)?))
}

pub fn parse_dynamic_ref(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    Ok(Box::new(RefKeyword::parse(value, ctx, ReferenceKind::Dynamic)?))
}
