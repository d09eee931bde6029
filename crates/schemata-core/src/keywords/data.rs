//! Experimental `data` keyword
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! `data` maps keyword names to JSON references. When data references are
//! enabled, the referenced values are collected into a schema that is then
//! applied to the current instance: `#/...` references point into the
//! instance document, absolute URIs are loaded through a [`DataFetcher`].

use super::{expect_object, listing, Keyword};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::pointer::JsonPointer;
use crate::resolver;
use crate::schema::{ParseContext, SchemaParser};
use serde_json::{Map, Value};
use url::Url;

/// Loads documents referenced by the `data` keyword
pub trait DataFetcher: Send + Sync {
    fn fetch(&self, uri: &Url) -> Option<Value>;
}

impl<F> DataFetcher for F
where
    F: Fn(&Url) -> Option<Value> + Send + Sync,
{
    fn fetch(&self, uri: &Url) -> Option<Value> {
        self(uri)
    }
}

#[derive(Debug)]
pub struct Data {
    raw: Value,
    references: Vec<(String, String)>,
    base: Url,
}

impl Data {
    fn lookup(&self, ctx: &mut EvaluationContext<'_>, reference: &str) -> Option<Value> {
        if let Some(fragment) = reference.strip_prefix('#') {
            let pointer = JsonPointer::from_fragment(fragment).ok()?;
            return pointer.evaluate(ctx.root_instance()).cloned();
        }

        let uri = self.base.join(reference).ok()?;
        resolver::resolve_data(ctx, &uri)
    }
}

impl Keyword for Data {
    fn evaluate(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        if !ctx.options().process_data_references {
            ctx.annotate(self.raw.clone());
            return Ok(());
        }

        let mut resolved = Map::new();
        let mut unresolved = Vec::new();
        for (keyword, reference) in &self.references {
            match self.lookup(ctx, reference) {
                Some(value) => {
                    resolved.insert(keyword.clone(), value);
                }
                None => unresolved.push(reference.clone()),
            }
        }
        if !unresolved.is_empty() {
            let message = ctx.message("data", &[("references", listing(&unresolved))]);
            ctx.fail(message);
            return Ok(());
        }

        let schema = SchemaParser::new()
            .with_base_uri(self.base.clone())
            .with_draft(ctx.draft())
            .with_catalog(ctx.options().catalog.clone())
            .parse(Value::Object(resolved))?;
        if !ctx.evaluate_in_place(schema.root(), &[], false)? {
            ctx.invalidate();
        }
        Ok(())
    }
}

pub fn parse_data(value: &Value, _: &Map<String, Value>, ctx: &mut ParseContext<'_>) -> Result<Box<dyn Keyword>> {
    let map = expect_object(value, ctx)?;
    let mut references = Vec::with_capacity(map.len());
    for (keyword, reference) in map {
        let reference = reference
            .as_str()
            .ok_or_else(|| ctx.error(format!("Data reference for '{}' must be a string", keyword)))?;
        references.push((keyword.clone(), reference.to_string()));
    }
    Ok(Box::new(Data {
        raw: value.clone(),
        references,
        base: ctx.base_uri().clone(),
    }))
}
