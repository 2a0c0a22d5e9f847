//! # Visiting Engine
//!
//! Runs active rules over a document, one rule at a time, in order.
//!
//! For every node a rule picks:
//!
//! 1. the node is cloned into a working copy and the rule visits the copy;
//! 2. a failing visit merges its errors into the report and leaves the
//!    document alone;
//! 3. a passing visit is diffed against the original node, and a non-empty
//!    delta is recorded as changes and, when the run mutates, applied to
//!    the node in place.
//!
//! The document is only borrowed mutably for that last write-back, so a
//! later rule sees every change an earlier rule committed.
//!
//! ## Rule-scoped failures
//!
//! A selector that does not parse, or a schema that does not compile,
//! produces one error for the rule and stops that rule. Other rules still
//! run.

use serde_json::Value;

use vetter_core::{apply, diff, DeltaOp};
use vetter_schema::SchemaRegistry;

use crate::catalog::RuleCatalog;
use crate::context::{Change, NodeOutcome, RuleError, RuleId, VisitorContext};
use crate::definition::RuleDefinition;
use crate::rule::Rule;
use crate::selector::RuleSelector;

/// The active rules of a catalog, bound to the catalog's registry.
#[derive(Debug, Clone)]
pub struct VisitingEngine<'c> {
    active: Vec<&'c RuleDefinition>,
    registry: &'c SchemaRegistry,
}

impl<'c> VisitingEngine<'c> {
    /// Select the active rules of `catalog`.
    pub fn new(catalog: &'c RuleCatalog, selector: &RuleSelector) -> Self {
        Self {
            active: selector.resolve(catalog.rules()),
            registry: catalog.registry(),
        }
    }

    /// Active rules, in run order.
    pub fn active(&self) -> &[&'c RuleDefinition] {
        &self.active
    }

    /// Run every active rule over `document` with a fresh context.
    pub fn visit(&self, document: &mut Value, mutate: bool) -> VisitorContext {
        let mut ctx = VisitorContext::new(mutate, self.registry.clone());
        run(&mut ctx, &self.active, document);
        ctx
    }
}

/// Run `active` over `document`, accumulating the report in `ctx`.
pub fn run(ctx: &mut VisitorContext, active: &[&RuleDefinition], document: &mut Value) {
    let span = ctx.span().clone();
    span.record("rules", active.len() as u64);
    let _entered = span.enter();

    for definition in active {
        match Rule::new(definition) {
            Ok(rule) => visit_rule(ctx, &rule, document),
            Err(e) => {
                tracing::error!(rule = %definition.name, error = %e, "rule selector is invalid, skipping rule");
                ctx.count_rule();
                let id = RuleId {
                    name: definition.name.clone(),
                    level: definition.level,
                };
                ctx.record_error(RuleError::select(id, &e));
            }
        }
    }

    let summary = ctx.summary();
    tracing::debug!(
        rules = summary.rules,
        nodes = summary.nodes,
        errors = summary.errors,
        changes = summary.changes,
        "run finished"
    );
}

/// Run one rule over every node it picks from `document`.
pub fn visit_rule(ctx: &mut VisitorContext, rule: &Rule, document: &mut Value) {
    ctx.count_rule();
    let nodes = rule.pick(ctx, document);

    for at in nodes {
        // An earlier node of this rule may have rewritten an ancestor.
        let Some(node) = document.pointer(&at) else {
            tracing::debug!(rule = rule.name(), node = %at, "picked node no longer exists");
            continue;
        };
        let mut working = node.clone();

        let result = match rule.visit(ctx, &at, &mut working) {
            Ok(Some(result)) => result,
            Ok(None) => {
                ctx.count_node(NodeOutcome::Filtered);
                continue;
            }
            Err(e) => {
                tracing::error!(rule = rule.name(), node = %at, error = %e, "rule schema failed to compile, skipping rule");
                ctx.record_error(RuleError::compile(rule.id(), &at, &e));
                return;
            }
        };

        if !result.is_clean() {
            tracing::warn!(rule = rule.name(), node = %at, errors = result.errors.len(), "check failed");
            ctx.count_node(NodeOutcome::Failed);
            ctx.merge(result);
            continue;
        }

        let delta = diff(node, &working);
        if delta.is_empty() {
            tracing::debug!(rule = rule.name(), node = %at, "check passed");
            ctx.count_node(NodeOutcome::Passed);
            continue;
        }

        tracing::info!(
            rule = rule.name(),
            node = %at,
            ops = delta.len(),
            mutate = ctx.mutate(),
            "check passed with modification"
        );
        ctx.count_node(NodeOutcome::Modified);

        let applied = ctx.mutate() && write_back(ctx, rule, document, &at, &delta);
        let id = rule.id();
        for op in delta {
            ctx.record_change(Change {
                rule: id.clone(),
                node: at.clone(),
                op,
                applied,
            });
        }
    }
}

fn write_back(
    ctx: &mut VisitorContext,
    rule: &Rule,
    document: &mut Value,
    at: &str,
    delta: &[DeltaOp],
) -> bool {
    let outcome = match document.pointer_mut(at) {
        Some(target) => apply(target, delta).map_err(|e| e.to_string()),
        None => Err(format!("node {at} vanished before write-back")),
    };
    match outcome {
        Ok(()) => true,
        Err(message) => {
            tracing::error!(rule = rule.name(), node = at, error = %message, "failed to apply delta");
            ctx.record_error(RuleError::apply(rule.id(), at, message));
            false
        }
    }
}
