//! # Schema Compilation
//!
//! Turns raw schema data ([`SchemaSpec`]) into a callable predicate
//! ([`CompiledPredicate`]) backed by the `jsonschema` crate.
//!
//! Raw and compiled forms are distinct types. A `SchemaSpec` is plain data
//! that rule definitions own and never mutate; compiling it produces an
//! independent predicate object and leaves the `SchemaSpec` untouched.
//!
//! ## Identity
//!
//! Every `SchemaSpec` carries a [`SchemaKey`], computed once when the
//! `SchemaSpec` is built: the SHA-256 of its JCS form together with the
//! literal text of every number it contains. Caches key compiled predicates
//! on it, so two rules with structurally equal schemas share one predicate.
//! JCS alone writes `1.0` as `1`; the number literals keep a `default: 1.0`
//! from sharing a predicate (and its inserted value) with a `default: 1`.
//!
//! ## Drafts
//!
//! Schemas default to Draft 7, the draft whose `definitions` keyword
//! rule-source files use. A schema that declares `$schema` selects its own
//! draft.

use std::fmt;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use vetter_core::{sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest};

use crate::defaults::insert_defaults;
use crate::registry::SchemaRegistry;

/// Error during schema handling.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema could not be canonicalized to derive its identity.
    #[error("schema identity error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The compiled validator could not be built (invalid schema or
    /// unresolvable `$ref`).
    #[error("schema {key} failed to compile: {reason}")]
    Compile {
        /// Identity of the schema that failed.
        key: SchemaKey,
        /// Reason reported by the validator builder.
        reason: String,
    },
}

/// Identity of a schema: the digest of its canonical JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaKey(ContentDigest);

impl SchemaKey {
    /// Derive the key for a schema value.
    pub fn of(schema: &Value) -> Result<Self, SchemaError> {
        let mut literals = Vec::new();
        number_literals(schema, &mut literals);
        let canonical = CanonicalBytes::new(&(schema, literals))?;
        Ok(Self(sha256_digest(&canonical)))
    }

    /// The full digest.
    pub fn digest(&self) -> &ContentDigest {
        &self.0
    }
}

/// Number literals of `value` as `serde_json` prints them, in key-sorted order.
fn number_literals(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(items) => {
            for item in items {
                number_literals(item, out);
            }
        }
        Value::Object(members) => {
            let mut sorted: Vec<_> = members.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            for (_, member) in sorted {
                number_literals(member, out);
            }
        }
        _ => {}
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.short())
    }
}

/// Raw schema data as written in a rule source.
///
/// Serializes as the bare schema value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct SchemaSpec {
    schema: Value,
    key: SchemaKey,
}

impl SchemaSpec {
    /// Wrap a schema value, computing its identity.
    pub fn new(schema: Value) -> Result<Self, SchemaError> {
        let key = SchemaKey::of(&schema)?;
        Ok(Self { schema, key })
    }

    /// The schema's identity.
    pub fn key(&self) -> SchemaKey {
        self.key
    }

    /// The raw schema value.
    pub fn as_value(&self) -> &Value {
        &self.schema
    }
}

impl TryFrom<Value> for SchemaSpec {
    type Error = SchemaError;

    fn try_from(schema: Value) -> Result<Self, Self::Error> {
        Self::new(schema)
    }
}

impl From<SchemaSpec> for Value {
    fn from(spec: SchemaSpec) -> Self {
        spec.schema
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON Pointer path to the violating field, relative to the checked node.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// A compiled schema, callable as a predicate over nodes.
pub struct CompiledPredicate {
    key: SchemaKey,
    schema: Value,
    validator: Validator,
    registry: SchemaRegistry,
}

impl fmt::Debug for CompiledPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPredicate")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl CompiledPredicate {
    /// Identity of the schema this predicate was compiled from.
    pub fn key(&self) -> SchemaKey {
        self.key
    }

    /// Pure predicate: does `node` satisfy the schema as-is?
    pub fn is_valid(&self, node: &Value) -> bool {
        self.validator.is_valid(node)
    }

    /// Every violation of the schema by `node`, in validator order.
    pub fn violations(&self, node: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(node)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }

    /// Fill declared defaults into `node`, then validate it.
    ///
    /// `node` must be a working copy: defaults are written into it whether
    /// or not validation passes.
    ///
    /// # Errors
    ///
    /// Returns every violation when the filled-in node is invalid.
    pub fn check(&self, node: &mut Value) -> Result<(), Vec<Violation>> {
        insert_defaults(&self.schema, &self.registry, node);
        let violations = self.violations(node);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Compile a schema, resolving `$ref`s against `registry`.
///
/// The returned predicate holds its own copy of the schema and a snapshot
/// of the registry; later registrations do not affect it.
///
/// # Errors
///
/// Returns `SchemaError::Compile` if the schema is invalid or references
/// definitions that are not registered.
pub fn compile(spec: &SchemaSpec, registry: &SchemaRegistry) -> Result<CompiledPredicate, SchemaError> {
    let mut opts = jsonschema::options();
    if spec.as_value().get("$schema").is_none() {
        opts.with_draft(jsonschema::Draft::Draft7);
    }
    opts.with_retriever(registry.retriever());

    let validator = opts.build(spec.as_value()).map_err(|e| SchemaError::Compile {
        key: spec.key(),
        reason: e.to_string(),
    })?;

    tracing::debug!(schema = %spec.key(), "compiled schema predicate");

    Ok(CompiledPredicate {
        key: spec.key(),
        schema: spec.as_value().clone(),
        validator,
        registry: registry.clone(),
    })
}
