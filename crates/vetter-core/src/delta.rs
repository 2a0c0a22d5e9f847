//! # Structural Delta
//!
//! `diff` compares two value trees and produces the ordered edit sequence
//! that turns the first into the second; `apply` replays that sequence
//! onto a target in place.
//!
//! ## Contract
//!
//! - `diff(a, a)` is empty.
//! - `apply(&mut a.clone(), &diff(a, b))` leaves the clone deep-equal to `b`.
//! - Applying to a value other than the `a` the delta was computed from is
//!   unsupported. It either fails with `DeltaError` or produces an
//!   unspecified tree.
//!
//! ## Operation order
//!
//! Objects are compared key by key (removed and changed keys in `a`'s key
//! order, then added keys in `b`'s key order). Arrays are compared index by
//! index over their common prefix; surplus elements of `b` are emitted as
//! ascending `Added` operations and surplus elements of `a` as descending
//! `Deleted` operations, so every index is valid at the moment its
//! operation is replayed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeltaError;
use crate::tree::escape_token;

/// One step from a container to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(key) => f.write_str(&escape_token(key)),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A single structural edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeltaOp {
    /// A key or element present only in the new tree.
    Added {
        /// Location relative to the diffed root.
        path: Vec<PathSegment>,
        /// The new value.
        rhs: Value,
    },
    /// A value that changed, or whose type changed.
    Edited {
        /// Location relative to the diffed root.
        path: Vec<PathSegment>,
        /// The old value.
        lhs: Value,
        /// The new value.
        rhs: Value,
    },
    /// A key or element present only in the old tree.
    Deleted {
        /// Location relative to the diffed root.
        path: Vec<PathSegment>,
        /// The removed value.
        lhs: Value,
    },
}

impl DeltaOp {
    /// Location of the edit relative to the diffed root.
    pub fn path(&self) -> &[PathSegment] {
        match self {
            Self::Added { path, .. } | Self::Edited { path, .. } | Self::Deleted { path, .. } => {
                path
            }
        }
    }

    /// Lowercase name of the operation kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Edited { .. } => "edited",
            Self::Deleted { .. } => "deleted",
        }
    }

    /// Location of the edit as a JSON Pointer relative to the diffed root.
    pub fn pointer(&self) -> String {
        segments_to_pointer(self.path())
    }
}

impl std::fmt::Display for DeltaOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ptr = self.pointer();
        let ptr = if ptr.is_empty() { "(root)" } else { ptr.as_str() };
        match self {
            Self::Added { rhs, .. } => write!(f, "added {ptr}: {rhs}"),
            Self::Edited { lhs, rhs, .. } => write!(f, "edited {ptr}: {lhs} -> {rhs}"),
            Self::Deleted { lhs, .. } => write!(f, "deleted {ptr}: {lhs}"),
        }
    }
}

/// Render path segments as a JSON Pointer.
pub fn segments_to_pointer(path: &[PathSegment]) -> String {
    path.iter().map(|seg| format!("/{seg}")).collect()
}

/// Compute the edit sequence turning `a` into `b`.
pub fn diff(a: &Value, b: &Value) -> Vec<DeltaOp> {
    let mut ops = Vec::new();
    let mut path = Vec::new();
    diff_into(a, b, &mut path, &mut ops);
    ops
}

fn diff_into(a: &Value, b: &Value, path: &mut Vec<PathSegment>, ops: &mut Vec<DeltaOp>) {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            for (key, lv) in left {
                path.push(PathSegment::Key(key.clone()));
                match right.get(key) {
                    Some(rv) => diff_into(lv, rv, path, ops),
                    None => ops.push(DeltaOp::Deleted {
                        path: path.clone(),
                        lhs: lv.clone(),
                    }),
                }
                path.pop();
            }
            for (key, rv) in right {
                if !left.contains_key(key) {
                    path.push(PathSegment::Key(key.clone()));
                    ops.push(DeltaOp::Added {
                        path: path.clone(),
                        rhs: rv.clone(),
                    });
                    path.pop();
                }
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            let common = left.len().min(right.len());
            for i in 0..common {
                path.push(PathSegment::Index(i));
                diff_into(&left[i], &right[i], path, ops);
                path.pop();
            }
            for (i, rv) in right.iter().enumerate().skip(common) {
                path.push(PathSegment::Index(i));
                ops.push(DeltaOp::Added {
                    path: path.clone(),
                    rhs: rv.clone(),
                });
                path.pop();
            }
            for i in (common..left.len()).rev() {
                path.push(PathSegment::Index(i));
                ops.push(DeltaOp::Deleted {
                    path: path.clone(),
                    lhs: left[i].clone(),
                });
                path.pop();
            }
        }
        _ if a == b => {}
        _ => ops.push(DeltaOp::Edited {
            path: path.clone(),
            lhs: a.clone(),
            rhs: b.clone(),
        }),
    }
}

/// Replay `ops` onto `target` in place.
///
/// An empty sequence is a no-op.
///
/// # Errors
///
/// Returns `DeltaError` when an operation addresses a location that does
/// not exist in `target`. Operations before the failing one stay applied.
pub fn apply(target: &mut Value, ops: &[DeltaOp]) -> Result<(), DeltaError> {
    for op in ops {
        apply_one(target, op)?;
    }
    Ok(())
}

fn apply_one(target: &mut Value, op: &DeltaOp) -> Result<(), DeltaError> {
    let Some((last, parents)) = op.path().split_last() else {
        return match op {
            DeltaOp::Added { rhs, .. } | DeltaOp::Edited { rhs, .. } => {
                *target = rhs.clone();
                Ok(())
            }
            DeltaOp::Deleted { .. } => Err(DeltaError::MissingTarget {
                op: "delete",
                pointer: String::new(),
            }),
        };
    };

    let mut container = target;
    for seg in parents {
        let child = match (seg, container) {
            (PathSegment::Key(key), Value::Object(map)) => map.get_mut(key),
            (PathSegment::Index(i), Value::Array(items)) => items.get_mut(*i),
            _ => None,
        };
        container = child.ok_or_else(|| DeltaError::MissingParent {
            pointer: op.pointer(),
        })?;
    }

    let missing = |verb: &'static str| DeltaError::MissingTarget {
        op: verb,
        pointer: op.pointer(),
    };

    match (last, container, op) {
        (PathSegment::Key(key), Value::Object(map), DeltaOp::Added { rhs, .. })
        | (PathSegment::Key(key), Value::Object(map), DeltaOp::Edited { rhs, .. }) => {
            map.insert(key.clone(), rhs.clone());
            Ok(())
        }
        (PathSegment::Key(key), Value::Object(map), DeltaOp::Deleted { .. }) => map
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| missing("delete")),
        (PathSegment::Index(i), Value::Array(items), DeltaOp::Added { rhs, .. }) => {
            if *i > items.len() {
                return Err(missing("add"));
            }
            items.insert(*i, rhs.clone());
            Ok(())
        }
        (PathSegment::Index(i), Value::Array(items), DeltaOp::Edited { rhs, .. }) => {
            let slot = items.get_mut(*i).ok_or_else(|| missing("edit"))?;
            *slot = rhs.clone();
            Ok(())
        }
        (PathSegment::Index(i), Value::Array(items), DeltaOp::Deleted { .. }) => {
            if *i >= items.len() {
                return Err(missing("delete"));
            }
            items.remove(*i);
            Ok(())
        }
        _ => Err(DeltaError::SegmentMismatch {
            pointer: op.pointer(),
        }),
    }
}
