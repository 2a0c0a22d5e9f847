//! # Canonical Serialization — JCS Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes used
//! to derive schema identities.
//!
//! Two schemas that differ only in key order or whitespace must share one
//! compiled predicate. Serializing through RFC 8785 (JSON Canonicalization
//! Scheme) gives sorted keys and compact separators, so structurally equal
//! schemas always produce identical bytes.

use serde::Serialize;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted, separators are compact (RFC 8785).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let bytes = serde_jcs::to_vec(obj)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_are_sorted() {
        let cb = CanonicalBytes::new(&json!({"b": 1, "a": 2})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_nested_objects_sorted() {
        let cb = CanonicalBytes::new(&json!({"z": {"y": true, "x": null}})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"z":{"x":null,"y":true}}"#);
    }

    #[test]
    fn test_floats_are_accepted() {
        let cb = CanonicalBytes::new(&json!({"minimum": 0.5})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"minimum":0.5}"#);
    }

    #[test]
    fn test_arrays_keep_order() {
        let cb = CanonicalBytes::new(&json!(["b", "a"])).unwrap();
        assert_eq!(cb.as_bytes(), br#"["b","a"]"#);
        assert!(!cb.is_empty());
        assert_eq!(cb.len(), 9);
    }
}
