//! # vetter-core — Foundational Types for vetter
//!
//! This crate is the leaf of the vetter workspace. It defines the value
//! representation every other crate works on and the two tree algorithms
//! the rule engine is built around.
//!
//! ## Key Design Principles
//!
//! 1. **One tree type.** Rule sources and target documents are both
//!    `serde_json::Value`. YAML input is converted once, at the edge
//!    ([`tree::parse_documents`]).
//!
//! 2. **Pointers, not references.** Path selection ([`select::pick`])
//!    returns RFC 6901 JSON Pointers. Callers re-resolve them, which keeps
//!    the document free to be borrowed mutably between selections.
//!
//! 3. **Deltas as data.** [`delta::diff`] yields a serializable edit
//!    sequence; [`delta::apply`] replays it. Reporting a would-be change and
//!    committing it are the same value used two ways.
//!
//! 4. **Canonical identities.** Schemas are identified by the SHA-256 of
//!    their JCS form ([`digest::sha256_digest`]), so equal schemas share
//!    one compiled predicate regardless of key order.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vetter-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod delta;
pub mod digest;
pub mod error;
pub mod level;
pub mod select;
pub mod tree;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use delta::{apply, diff, DeltaOp, PathSegment};
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, DeltaError, SelectError, TreeError, VetterError};
pub use level::Severity;
pub use select::{pick, PathExpr};
pub use tree::{parse_documents, render_documents, yaml_to_json_value, DocumentFormat};
