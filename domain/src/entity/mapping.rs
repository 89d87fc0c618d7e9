//! Document mapping entity
//!
//! A lightweight `url -> ipfs_hash` reference with its own status, used once
//! documents are split into reference (mapping) and payload (full document)
//! to bound the size of the lockstep-replicated store versus off-chain blob
//! storage.

use serde::{Deserialize, Serialize};

use super::lifecycle::{Lifecycle, NOT_BLACKLISTED};
use super::status::ProcessingStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMapping {
    /// Identity key
    pub url: String,
    /// Content hash of the full document in the blob store, if published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    #[serde(default)]
    pub status: ProcessingStatus,
    #[serde(default = "default_blacklist_expiration")]
    pub blacklist_expiration: i64,
}

fn default_blacklist_expiration() -> i64 {
    NOT_BLACKLISTED
}

impl DocumentMapping {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ipfs_hash: None,
            status: ProcessingStatus::Unprocessed,
            blacklist_expiration: NOT_BLACKLISTED,
        }
    }

    pub fn with_ipfs_hash(mut self, hash: impl Into<String>) -> Self {
        self.ipfs_hash = Some(hash.into());
        self
    }
}

impl Lifecycle for DocumentMapping {
    fn key(&self) -> &str {
        &self.url
    }

    fn status(&self) -> ProcessingStatus {
        self.status
    }

    fn set_status(&mut self, status: ProcessingStatus) {
        self.status = status;
    }

    fn blacklist_expiration(&self) -> i64 {
        self.blacklist_expiration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_defaults() {
        let mapping = DocumentMapping::new("https://example.com/a");
        assert_eq!(mapping.status, ProcessingStatus::Unprocessed);
        assert!(mapping.ipfs_hash.is_none());
        assert!(!mapping.is_frozen(0));
    }

    #[test]
    fn test_mapping_freeze_on_blacklist() {
        let mut mapping = DocumentMapping::new("https://example.com/a");
        mapping.status = ProcessingStatus::Blacklisted;
        mapping.blacklist_expiration = 50;
        assert!(mapping.is_frozen(10));
        assert!(!mapping.is_frozen(50));
    }
}
