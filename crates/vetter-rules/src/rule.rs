//! # Rule
//!
//! A [`RuleDefinition`] with its selector parsed, ready to run. `pick`
//! finds the nodes the rule applies to; `visit` evaluates the filter and
//! check predicates against a working copy of one of them.

use serde_json::Value;

use vetter_core::{PathExpr, SelectError, Severity};
use vetter_schema::SchemaError;

use crate::context::{RuleError, RuleId, VisitorContext, VisitorResult};
use crate::definition::RuleDefinition;

/// A runnable rule.
#[derive(Debug, Clone)]
pub struct Rule {
    definition: RuleDefinition,
    path: PathExpr,
}

impl Rule {
    /// Parse the definition's selector.
    ///
    /// # Errors
    ///
    /// Returns `SelectError` if `select` is not a valid path expression.
    pub fn new(definition: &RuleDefinition) -> Result<Self, SelectError> {
        let path = PathExpr::parse(&definition.select)?;
        Ok(Self {
            definition: definition.clone(),
            path,
        })
    }

    /// The definition this rule was built from.
    pub fn definition(&self) -> &RuleDefinition {
        &self.definition
    }

    /// Rule name.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Rule severity.
    pub fn level(&self) -> Severity {
        self.definition.level
    }

    /// Identity used in reports.
    pub fn id(&self) -> RuleId {
        RuleId {
            name: self.definition.name.clone(),
            level: self.definition.level,
        }
    }

    /// The parsed selector.
    pub fn path(&self) -> &PathExpr {
        &self.path
    }

    /// JSON Pointers of the nodes this rule applies to, in document order.
    ///
    /// An empty result is logged, not reported.
    pub fn pick(&self, _ctx: &VisitorContext, root: &Value) -> Vec<String> {
        let nodes = self.path.select(root);
        if nodes.is_empty() {
            tracing::info!(rule = %self.definition.name, select = %self.path, "selector matched no nodes");
        }
        nodes
    }

    /// Run the filter and check predicates against `node`.
    ///
    /// `node` is the caller's working copy of the node at pointer `at`; the
    /// check may fill defaults into it. Returns `None` when the filter
    /// rejects the node, otherwise a result holding one error per
    /// violation.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the filter or check schema fails to compile.
    pub fn visit(
        &self,
        ctx: &mut VisitorContext,
        at: &str,
        node: &mut Value,
    ) -> Result<Option<VisitorResult>, SchemaError> {
        if let Some(filter) = &self.definition.filter {
            let guard = ctx.predicate(filter)?;
            if !guard.is_valid(node) {
                tracing::debug!(rule = %self.definition.name, node = at, "node filtered out");
                return Ok(None);
            }
        }

        let check = ctx.predicate(&self.definition.check)?;
        let mut result = VisitorResult::default();
        if let Err(violations) = check.check(node) {
            let id = self.id();
            result.errors.extend(
                violations
                    .into_iter()
                    .map(|violation| RuleError::check(id.clone(), at, violation)),
            );
        }
        Ok(Some(result))
    }
}
