//! # vetter-rules — Rule Engine
//!
//! Loads declarative rules, selects the active subset, and runs them
//! against YAML/JSON documents, reporting violations and optionally
//! writing rule-induced corrections back.
//!
//! ## Loading (`catalog`, `definition`)
//!
//! [`RuleCatalog`] parses rule-source files into [`RuleDefinition`]s and
//! registers each document's shared `definitions` with the catalog's
//! schema registry. Loads are all or nothing.
//!
//! ## Selection (`selector`)
//!
//! [`RuleSelector`] holds six include/exclude criteria sets. Exclusion
//! dominates inclusion, and an empty selector activates no rules.
//!
//! ## Running (`rule`, `engine`, `context`)
//!
//! [`Rule::pick`] selects nodes by path expression; [`Rule::visit`] runs
//! the filter and check predicates against a working copy of each node.
//! [`engine::run`] diffs passing copies against the document and, when the
//! [`VisitorContext`] allows mutation, applies the delta in place.
//!
//! ## Crate Policy
//!
//! - Rule failures never abort a run; only catalog loading is fatal.
//! - No global state: everything a run needs travels in its context.

pub mod catalog;
pub mod context;
pub mod definition;
pub mod engine;
pub mod error;
pub mod rule;
pub mod selector;

pub use catalog::RuleCatalog;
pub use context::{Change, RuleError, RuleErrorKind, RuleId, RunSummary, VisitorContext, VisitorResult};
pub use definition::{RuleDefinition, RuleSource, ROOT_SELECTOR};
pub use engine::{run, visit_rule, VisitingEngine};
pub use error::CatalogError;
pub use rule::Rule;
pub use selector::RuleSelector;
