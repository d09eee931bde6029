//! Reference resolution
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! `$ref` targets are resolved statically against the resource that declares
//! them. `$recursiveRef` and `$dynamicRef` start from the static target and,
//! when that target opts in, switch to the outermost matching resource in the
//! dynamic scope.

use crate::context::{DynamicScopeFrame, EvaluationContext};
use crate::error::{Error, Result};
use crate::pointer::{percent_decode, JsonPointer};
use crate::registry::SchemaResource;
use crate::schema::SchemaNode;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;
use url::Url;

/// How a reference keyword picks its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `$ref`
    Static,
    /// `$recursiveRef`
    Recursive,
    /// `$dynamicRef`
    Dynamic,
}

pub(crate) fn resolve(
    ctx: &mut EvaluationContext<'_>,
    kind: ReferenceKind,
    target: &Url,
) -> Result<Arc<SchemaNode>> {
    trace!(reference = %target, ?kind, "Resolving reference");
    match kind {
        ReferenceKind::Static => resolve_static(ctx, target),
        ReferenceKind::Recursive => resolve_recursive(ctx, target),
        ReferenceKind::Dynamic => resolve_dynamic(ctx, target),
    }
}

/// Resolve a `data` reference to an absolute URI. The document is loaded
/// through the context; a fragment selects a value inside it.
pub(crate) fn resolve_data(ctx: &mut EvaluationContext<'_>, target: &Url) -> Option<Value> {
    trace!(reference = %target, "Resolving data reference");
    let document = ctx.locate_data_document(target)?;
    match target.fragment() {
        Some(fragment) if !fragment.is_empty() => JsonPointer::from_fragment(fragment)
            .ok()?
            .evaluate(&document)
            .cloned(),
        _ => Some(document.as_ref().clone()),
    }
}

fn resolve_static(ctx: &mut EvaluationContext<'_>, target: &Url) -> Result<Arc<SchemaNode>> {
    let resource = ctx.locate_resource(target)?;
    node_in(ctx, &resource, target)
}

/// Find the node a fragment names inside an already located resource
fn node_in(
    ctx: &mut EvaluationContext<'_>,
    resource: &SchemaResource,
    target: &Url,
) -> Result<Arc<SchemaNode>> {
    let fragment = target.fragment().unwrap_or("");
    if fragment.is_empty() {
        return Ok(resource.root().clone());
    }

    if fragment.starts_with('/') {
        let pointer = JsonPointer::from_fragment(fragment)
            .map_err(|e| Error::unresolved(target.as_str(), resource.base_uri().as_str(), e.to_string()))?;
        if let Some(node) = resource.node_at(&pointer) {
            return Ok(node.clone());
        }
        return ctx.parse_on_demand(resource, &pointer)?.ok_or_else(|| {
            Error::unresolved(
                target.as_str(),
                resource.base_uri().as_str(),
                format!("pointer '{}' does not resolve", pointer),
            )
        });
    }

    let name = percent_decode(fragment);
    resource.anchor(&name).cloned().ok_or_else(|| {
        Error::unresolved(
            target.as_str(),
            resource.base_uri().as_str(),
            format!("no anchor named '{}'", name),
        )
    })
}

fn resolve_dynamic(ctx: &mut EvaluationContext<'_>, target: &Url) -> Result<Arc<SchemaNode>> {
    let fragment = target.fragment().unwrap_or("");
    if fragment.is_empty() || fragment.starts_with('/') {
        return resolve_static(ctx, target);
    }
    let name = percent_decode(fragment);

    let (nominal, bookended) = match ctx.locate_resource(target) {
        Ok(resource) => {
            let nominal = node_in(ctx, &resource, target);
            let bookended = nominal.is_err() || resource.declares_dynamic_anchor(&name);
            (nominal, bookended)
        }
        Err(e) => (Err(e), true),
    };
    if !bookended {
        return nominal;
    }

    match outermost_dynamic_anchor(ctx.dynamic_scope(), &name) {
        Some(node) => {
            trace!(anchor = %name, target = %node.location(), "Dynamic reference bound");
            Ok(node)
        }
        None => nominal,
    }
}

fn resolve_recursive(ctx: &mut EvaluationContext<'_>, target: &Url) -> Result<Arc<SchemaNode>> {
    let nominal = resolve_static(ctx, target)?;
    if !nominal.is_resource_root() {
        return Ok(nominal);
    }
    let opted_in = ctx
        .known_resource(nominal.base_uri())
        .map(|resource| resource.has_recursive_anchor())
        .unwrap_or(false);
    if !opted_in {
        return Ok(nominal);
    }
    Ok(outermost_recursive_anchor(ctx.dynamic_scope()).unwrap_or(nominal))
}

/// The dynamic anchor `name` of the outermost resource in scope declaring it
pub fn outermost_dynamic_anchor(scope: &[DynamicScopeFrame], name: &str) -> Option<Arc<SchemaNode>> {
    scope
        .iter()
        .find_map(|frame| frame.resource().dynamic_anchor(name).cloned())
}

/// Root of the outermost resource in scope with `$recursiveAnchor: true`
pub fn outermost_recursive_anchor(scope: &[DynamicScopeFrame]) -> Option<Arc<SchemaNode>> {
    scope
        .iter()
        .find(|frame| frame.resource().has_recursive_anchor())
        .map(|frame| frame.resource().root().clone())
}
