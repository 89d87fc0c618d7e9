//! Canonical payload normalization
//!
//! Rounds agree on *bit-identical* payloads. Two semantically equal but
//! differently-serialized payloads must not be treated as agreeing, so every
//! payload is normalized before comparison: parsed into a
//! [`serde_json::Value`] (whose object maps are sorted) and re-serialized in
//! compact form with canonical number formatting.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::DomainError;

/// A payload in normalized serialized form.
///
/// Equality on `CanonicalPayload` is byte equality of the normalized form,
/// which is exactly the comparison the ballot box performs. Ordering is
/// byte ordering of the same form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalPayload(String);

impl CanonicalPayload {
    /// Normalize a JSON value.
    pub fn normalize(value: &Value) -> Self {
        // Value objects are BTreeMaps, so serialization is key-sorted.
        Self(value.to_string())
    }

    /// Parse raw JSON text and normalize it.
    pub fn from_raw_json(raw: &str) -> Result<Self, DomainError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::normalize(&value))
    }

    /// Serialize any value through `serde_json::Value` and normalize it.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, DomainError> {
        Ok(Self::normalize(&serde_json::to_value(value)?))
    }

    /// Deserialize the payload back into a JSON value.
    pub fn value(&self) -> Value {
        // The inner string is always valid JSON by construction.
        serde_json::from_str(&self.0).unwrap_or(Value::Null)
    }

    /// Whether this is the declared "nothing to commit" payload.
    pub fn is_none_payload(&self) -> bool {
        self.0 == "null"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical JSON text for any serializable value.
///
/// Used wherever artifacts must serialize identically across agents before
/// hashing or storage.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, DomainError> {
    Ok(serde_json::to_value(value)?.to_string())
}
