//! # Visitor Context
//!
//! Per-run state threaded through every rule visit: the logging span, the
//! schema registry, the compiled-predicate cache, the `mutate` flag and the
//! accumulated report.
//!
//! A context belongs to exactly one run over one document. Runs never share
//! a context, so nothing here is global or synchronized.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use vetter_core::{DeltaOp, SelectError, Severity};
use vetter_schema::{CacheStats, CompiledPredicate, PredicateCache, SchemaError, SchemaRegistry, SchemaSpec, Violation};

/// Identity of a rule in reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId {
    /// Rule name.
    pub name: String,
    /// Rule severity.
    pub level: Severity,
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level, self.name)
    }
}

/// What went wrong for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleErrorKind {
    /// The check predicate rejected a node.
    Check,
    /// The rule's `select` expression does not parse.
    Select,
    /// The rule's check or filter schema does not compile.
    Compile,
    /// A computed delta could not be written back.
    Apply,
}

impl RuleErrorKind {
    /// Lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Select => "select",
            Self::Compile => "compile",
            Self::Apply => "apply",
        }
    }
}

impl fmt::Display for RuleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported failure, attributed to the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleError {
    /// The originating rule.
    pub rule: RuleId,
    /// Failure kind.
    pub kind: RuleErrorKind,
    /// JSON Pointer of the picked node within the document.
    pub node: String,
    /// JSON Pointer of the offending value within the node.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl RuleError {
    /// A check violation on the node at `node`.
    pub fn check(rule: RuleId, node: &str, violation: Violation) -> Self {
        Self {
            rule,
            kind: RuleErrorKind::Check,
            node: node.to_string(),
            path: violation.instance_path,
            message: violation.message,
        }
    }

    /// The rule's selector failed to parse.
    pub fn select(rule: RuleId, err: &SelectError) -> Self {
        Self {
            rule,
            kind: RuleErrorKind::Select,
            node: String::new(),
            path: String::new(),
            message: err.to_string(),
        }
    }

    /// A predicate of the rule failed to compile.
    pub fn compile(rule: RuleId, node: &str, err: &SchemaError) -> Self {
        Self {
            rule,
            kind: RuleErrorKind::Compile,
            node: node.to_string(),
            path: String::new(),
            message: err.to_string(),
        }
    }

    /// A delta for the node at `node` could not be applied.
    pub fn apply(rule: RuleId, node: &str, message: impl Into<String>) -> Self {
        Self {
            rule,
            kind: RuleErrorKind::Apply,
            node: node.to_string(),
            path: String::new(),
            message: message.into(),
        }
    }

    /// Document-absolute JSON Pointer of the offending value.
    pub fn pointer(&self) -> String {
        format!("{}{}", self.node, self.path)
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ptr = self.pointer();
        let ptr = if ptr.is_empty() { "(root)" } else { ptr.as_str() };
        if self.kind == RuleErrorKind::Check {
            write!(f, "{} {}: {}", self.rule, ptr, self.message)
        } else {
            write!(f, "{} {} [{}]: {}", self.rule, ptr, self.kind, self.message)
        }
    }
}

/// A modification a passing rule made to its working copy of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// The rule whose check rewrote the node.
    pub rule: RuleId,
    /// JSON Pointer of the picked node within the document.
    pub node: String,
    /// The edit, relative to the node.
    pub op: DeltaOp,
    /// Whether the edit was written back into the document.
    pub applied: bool,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = if self.node.is_empty() { "(root)" } else { self.node.as_str() };
        let state = if self.applied { "applied" } else { "pending" };
        write!(f, "{} {node}: {} ({state})", self.rule, self.op)
    }
}

/// Accumulated changes and errors, in the order they occurred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitorResult {
    /// Changes, applied or not.
    pub changes: Vec<Change>,
    /// Errors.
    pub errors: Vec<RuleError>,
}

impl VisitorResult {
    /// Append everything in `other`, preserving order.
    pub fn merge(&mut self, other: VisitorResult) {
        self.changes.extend(other.changes);
        self.errors.extend(other.errors);
    }

    /// Returns true if no errors were recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if nothing at all was recorded.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.errors.is_empty()
    }
}

/// How one (rule, node) visit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeOutcome {
    Passed,
    Modified,
    Failed,
    Filtered,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Rules visited.
    pub rules: usize,
    /// (rule, node) pairs visited, filtered ones included.
    pub nodes: usize,
    /// Nodes that passed unchanged.
    pub passed: usize,
    /// Nodes that passed with a modification.
    pub modified: usize,
    /// Nodes that failed their check.
    pub failed: usize,
    /// Nodes skipped by a filter.
    pub filtered: usize,
    /// Errors reported, of every kind.
    pub errors: usize,
    /// Changes recorded.
    pub changes: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules, {} nodes: {} passed, {} modified, {} failed, {} filtered; {} errors, {} changes",
            self.rules,
            self.nodes,
            self.passed,
            self.modified,
            self.failed,
            self.filtered,
            self.errors,
            self.changes
        )
    }
}

/// State for one run over one document.
#[derive(Debug)]
pub struct VisitorContext {
    span: tracing::Span,
    registry: SchemaRegistry,
    cache: PredicateCache,
    result: VisitorResult,
    mutate: bool,
    summary: RunSummary,
}

impl VisitorContext {
    /// Start a run. `mutate` is fixed for the run's lifetime.
    pub fn new(mutate: bool, registry: SchemaRegistry) -> Self {
        Self {
            span: tracing::info_span!("visit", mutate, rules = tracing::field::Empty),
            registry,
            cache: PredicateCache::new(),
            result: VisitorResult::default(),
            mutate,
            summary: RunSummary::default(),
        }
    }

    /// Whether passing-with-modification nodes are written back.
    pub fn mutate(&self) -> bool {
        self.mutate
    }

    /// The run's span. Engine events are emitted inside it.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Registry used to resolve shared definitions.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The compiled predicate for `spec`, compiling it on first use.
    pub fn predicate(&mut self, spec: &SchemaSpec) -> Result<Arc<CompiledPredicate>, SchemaError> {
        self.cache.get_or_compile(spec, &self.registry)
    }

    /// Cache hit/miss counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Append a partial result to the report.
    pub fn merge(&mut self, result: VisitorResult) {
        self.result.merge(result);
    }

    /// Append one error to the report.
    pub fn record_error(&mut self, error: RuleError) {
        self.result.errors.push(error);
    }

    /// Append one change to the report.
    pub fn record_change(&mut self, change: Change) {
        self.result.changes.push(change);
    }

    /// The report so far.
    pub fn report(&self) -> &VisitorResult {
        &self.result
    }

    /// Consume the context, keeping only the report.
    pub fn into_report(self) -> VisitorResult {
        self.result
    }

    /// Counters so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            errors: self.result.errors.len(),
            changes: self.result.changes.len(),
            ..self.summary
        }
    }

    pub(crate) fn count_rule(&mut self) {
        self.summary.rules += 1;
    }

    pub(crate) fn count_node(&mut self, outcome: NodeOutcome) {
        self.summary.nodes += 1;
        match outcome {
            NodeOutcome::Passed => self.summary.passed += 1,
            NodeOutcome::Modified => self.summary.modified += 1,
            NodeOutcome::Failed => self.summary.failed += 1,
            NodeOutcome::Filtered => self.summary.filtered += 1,
        }
    }
}
