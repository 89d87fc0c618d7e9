//! Processing status shared by all entity variants

use serde::{Deserialize, Serialize};

/// Lifecycle status of a document, query or mapping.
///
/// Status is mutated only through agreed round outputs, never by a single
/// agent unilaterally: local flips become durable only once the round that
/// produced them reaches quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Discovered but not yet worked on
    #[default]
    Unprocessed,
    /// Content has been embedded and published
    Processed,
    /// Judged unsafe or unusable, excluded until the expiration timestamp
    Blacklisted,
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStatus::Unprocessed => write!(f, "unprocessed"),
            ProcessingStatus::Processed => write!(f, "processed"),
            ProcessingStatus::Blacklisted => write!(f, "blacklisted"),
        }
    }
}
