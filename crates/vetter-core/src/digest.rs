//! # Content Digest — Schema Identities
//!
//! `ContentDigest` is the SHA-256 of a value's canonical bytes. The schema
//! layer keys its compiled-predicate cache on it, so "same schema" means
//! "same canonical JSON", independent of where the schema came from.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A SHA-256 digest over canonical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(12);
        hex
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, so every digest in the system is taken
/// over the JCS form of its value.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest { bytes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sha256_digest_deterministic() {
        let cb = CanonicalBytes::new(&json!({"type": "object"})).unwrap();
        assert_eq!(sha256_digest(&cb), sha256_digest(&cb));
    }

    #[test]
    fn test_key_order_does_not_change_digest() {
        let a = CanonicalBytes::new(&json!({"type": "object", "required": ["port"]})).unwrap();
        let b = CanonicalBytes::new(&json!({"required": ["port"], "type": "object"})).unwrap();
        assert_eq!(sha256_digest(&a), sha256_digest(&b));
    }

    #[test]
    fn test_different_inputs_different_digests() {
        let cb1 = CanonicalBytes::new(&json!({"a": 1})).unwrap();
        let cb2 = CanonicalBytes::new(&json!({"a": 2})).unwrap();
        assert_ne!(sha256_digest(&cb1), sha256_digest(&cb2));
    }

    #[test]
    fn test_known_sha256_vector() {
        let cb = CanonicalBytes::new(&json!({})).unwrap();
        let digest = sha256_digest(&cb);
        assert_eq!(
            digest.to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
        assert_eq!(digest.short(), "44136fa355b3");
        assert!(digest.to_string().starts_with("sha256:"));
    }
}
