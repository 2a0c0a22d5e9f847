//! # vetter-schema — Schema Compilation
//!
//! Provides the predicate capability the rule engine consumes: raw schema
//! data in, a callable predicate with structured violations out.
//!
//! ## Runtime Validation (`validate`)
//!
//! [`validate::compile`] builds a `jsonschema` validator from a
//! [`SchemaSpec`]. [`CompiledPredicate::check`] fills declared defaults into
//! a working copy of a node ([`defaults`]) and then validates it.
//!
//! ## Shared Definitions (`registry`)
//!
//! [`SchemaRegistry`] holds the `definitions` maps embedded in rule-source
//! documents. Compilation resolves `name#/definitions/...` references
//! against it and never reaches the network.
//!
//! ## Caching (`cache`)
//!
//! [`PredicateCache`] keys compiled predicates by schema identity
//! ([`SchemaKey`]), so each distinct schema compiles once per run.
//!
//! ## Crate Policy
//!
//! - Depends only on `vetter-core` internally.
//! - A `SchemaSpec` is never mutated by compilation.

pub mod cache;
pub mod defaults;
pub mod registry;
pub mod validate;

pub use cache::{CacheStats, PredicateCache};
pub use registry::SchemaRegistry;
pub use validate::{compile, CompiledPredicate, SchemaError, SchemaKey, SchemaSpec, Violation};
