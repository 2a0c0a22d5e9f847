//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used by the foundational layer. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Tree conversion errors name the offending YAML construct.
//! - Path-selection errors carry the expression and the byte offset at
//!   which parsing stopped.
//! - Delta errors carry the JSON Pointer of the operation that could not
//!   be applied.

use thiserror::Error;

/// Top-level error type for vetter-core.
#[derive(Error, Debug)]
pub enum VetterError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A YAML or JSON tree could not be parsed or converted.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// A path expression could not be parsed.
    #[error("path selection error: {0}")]
    Select(#[from] SelectError),

    /// A structural delta could not be applied.
    #[error("delta error: {0}")]
    Delta(#[from] DeltaError),

    /// Unknown severity level name.
    #[error("unknown severity level: {0:?}")]
    UnknownLevel(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error while parsing or converting a document tree.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The text is not valid YAML.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML construct has no JSON equivalent.
    #[error("unsupported YAML construct: {0}")]
    Unsupported(String),
}

/// Error while parsing a path-selection expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid path {path:?} at offset {offset}: {reason}")]
pub struct SelectError {
    /// The full expression being parsed.
    pub path: String,
    /// Byte offset at which parsing failed.
    pub offset: usize,
    /// What was expected at that offset.
    pub reason: String,
}

/// Error while applying a structural delta.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeltaError {
    /// The parent container of the operation does not exist in the target.
    #[error("no container at {pointer}")]
    MissingParent {
        /// JSON Pointer of the operation.
        pointer: String,
    },

    /// The operation addresses a key or index that is absent.
    #[error("nothing to {op} at {pointer}")]
    MissingTarget {
        /// Operation kind.
        op: &'static str,
        /// JSON Pointer of the operation.
        pointer: String,
    },

    /// The path segment kind does not match the container kind.
    #[error("segment type mismatch at {pointer}")]
    SegmentMismatch {
        /// JSON Pointer of the operation.
        pointer: String,
    },
}
