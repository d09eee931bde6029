//! Evaluation driver
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license
//!
//! Walks a schema node against the instance under the cursor: enter the
//! node, run its keywords in priority order, fold their results into a node
//! result, leave the node.

use crate::catalog::UNEVALUATED_PRIORITY;
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::options::ValidationOptions;
use crate::output::EvaluationResults;
use crate::result::LocalResult;
use crate::schema::{JsonSchema, KeywordInstance, NodeKind, SchemaNode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Validate `instance` against `schema`.
///
/// Assertion failures end up in the returned results; only structural
/// problems such as exceeding the traversal limit are returned as errors.
pub fn validate(schema: &JsonSchema, instance: &Value, options: &ValidationOptions) -> Result<EvaluationResults> {
    let prepared = schema.prepared_for(options)?;
    let schema = prepared.as_ref().unwrap_or(schema);

    debug!(schema = %schema.base_uri(), draft = %schema.root().draft(), "Starting validation");
    let mut ctx = EvaluationContext::new(schema, instance, options);
    let root = evaluate_node(&mut ctx, schema.root())?;
    debug!(valid = root.valid, "Validation finished");

    Ok(EvaluationResults::new(root, options.output_format))
}

/// Free stack below which another segment is allocated before descending
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each additional stack segment
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Evaluate one node. Recursion depth is bounded only by
/// `max_traversal_depth`, so the stack grows on demand rather than
/// overflowing before the limit is reached.
pub(crate) fn evaluate_node(ctx: &mut EvaluationContext<'_>, node: &Arc<SchemaNode>) -> Result<LocalResult> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || enter_node(ctx, node))
}

fn enter_node(ctx: &mut EvaluationContext<'_>, node: &Arc<SchemaNode>) -> Result<LocalResult> {
    let scope = ctx.enter_scope(node)?;
    ctx.begin_node(node);

    let outcome = match node.kind() {
        NodeKind::Boolean(true) => Ok(()),
        NodeKind::Boolean(false) => {
            let message = ctx.message("falseSchema", &[]);
            ctx.fail(message);
            Ok(())
        }
        NodeKind::Keywords(keywords) => run_keywords(ctx, node, keywords),
    };

    let result = ctx.end_node();
    ctx.exit_scope(scope);
    outcome?;

    ctx.trace(|| {
        format!(
            "{} {} at '{}'",
            result.schema_location,
            if result.valid { "passed" } else { "failed" },
            result.instance_location
        )
    });
    Ok(result)
}

fn run_keywords(ctx: &mut EvaluationContext<'_>, node: &SchemaNode, keywords: &[KeywordInstance]) -> Result<()> {
    let unknown: Vec<String> = ctx
        .vocabularies()
        .map(|set| set.unknown_required().into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    if !unknown.is_empty() {
        let message = ctx.message("unknownVocabulary", &[("vocabularies", unknown.join(", "))]);
        ctx.fail(message);
        return Ok(());
    }

    let has_consumer = keywords.iter().any(|k| k.priority() == UNEVALUATED_PRIORITY);
    let inherited = ctx.annotations_needed();
    ctx.set_annotations_needed(inherited || has_consumer);
    let outcome = run_ordered(ctx, node, keywords, has_consumer);
    ctx.set_annotations_needed(inherited);
    outcome
}

fn run_ordered(
    ctx: &mut EvaluationContext<'_>,
    node: &SchemaNode,
    keywords: &[KeywordInstance],
    has_consumer: bool,
) -> Result<()> {
    let ref_only = node.draft().ref_overrides_siblings() && node.keyword("$ref").is_some();
    let short_circuit = ctx.options().short_circuits();
    let mut failed = false;

    for keyword in keywords {
        if ref_only && keyword.name() != "$ref" {
            continue;
        }
        let descriptor = keyword.descriptor();
        if short_circuit && failed {
            let still_needed = has_consumer
                && (descriptor.produces_dependent_annotations() || descriptor.priority() == UNEVALUATED_PRIORITY);
            if !still_needed {
                ctx.skip_keyword(node, keyword);
                continue;
            }
        }

        let active = descriptor.supports(ctx.draft()) && ctx.keyword_enabled(descriptor);
        let annotation_only = descriptor.is_annotation_only() || !active;

        ctx.enter_keyword(node, keyword);
        let outcome = if active {
            keyword.keyword().evaluate(ctx)
        } else {
            ctx.annotate(keyword.raw().clone());
            Ok(())
        };
        if let Err(e) = outcome {
            if e.is_fatal() {
                return Err(e);
            }
            ctx.fail(e.to_string());
        }
        let passed = ctx.exit_keyword(annotation_only);

        ctx.trace(|| {
            format!(
                "{}#{} {}",
                node.base_uri(),
                node.pointer().join(keyword.name()),
                if passed { "passed" } else { "failed" }
            )
        });
        if !passed {
            failed = true;
        }
    }
    Ok(())
}
