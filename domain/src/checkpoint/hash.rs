//! Content addressing for published artifacts

use serde::{Deserialize, Serialize};

use crate::core::DomainError;

/// Blake3 digest of an artifact's canonical bytes, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// Parse a hex digest produced by an earlier `of_bytes` call.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidHash(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash a value through its canonical JSON rendering, so that every
/// participant derives the same digest from the same logical content.
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<ContentHash, DomainError> {
    let canonical = crate::round::to_canonical_json(value)?;
    Ok(ContentHash::of_bytes(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_hash_is_hex_and_stable() {
        let a = ContentHash::of_bytes(b"hello");
        let b = ContentHash::of_bytes(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ContentHash::parse("not-a-hash").is_err());
        assert!(ContentHash::parse(&"a".repeat(63)).is_err());
        let hex = ContentHash::of_bytes(b"x").as_str().to_string();
        assert_eq!(ContentHash::parse(&hex).unwrap().as_str(), hex);
    }

    #[test]
    fn test_hash_canonical_ignores_key_order() {
        let mut first = BTreeMap::new();
        first.insert("b", 2);
        first.insert("a", 1);
        let json_a: serde_json::Value = serde_json::json!({"a": 1, "b": 2});
        let json_b: serde_json::Value = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(
            hash_canonical(&json_a).unwrap(),
            hash_canonical(&json_b).unwrap()
        );
        assert_eq!(
            hash_canonical(&first).unwrap(),
            hash_canonical(&json_a).unwrap()
        );
    }
}
