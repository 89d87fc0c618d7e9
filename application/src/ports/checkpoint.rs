//! Checkpoint register port
//!
//! The shared, append-only record of manifest hashes. Each entry anchors one
//! published artifact set; the latest entry is where a restarting
//! participant resumes from.

use async_trait::async_trait;
use researcher_domain::ContentHash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Register unavailable: {0}")]
    Unavailable(String),

    #[error("Record rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait CheckpointRegister: Send + Sync {
    /// Append a manifest hash to the chain.
    async fn record(&self, hash: &ContentHash) -> Result<(), CheckpointError>;

    /// The most recently recorded manifest hash, if any.
    async fn latest(&self) -> Result<Option<ContentHash>, CheckpointError>;

    /// The full chain, oldest first.
    async fn history(&self) -> Result<Vec<ContentHash>, CheckpointError>;
}
