//! In-memory checkpoint register
//!
//! Shared append-only chain for local multi-participant runs. Cloning
//! shares the chain. Appends are idempotent at the tip so each participant
//! of a finalized round can record the same manifest hash.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use researcher_application::ports::checkpoint::{CheckpointError, CheckpointRegister};
use researcher_domain::ContentHash;

#[derive(Clone, Default)]
pub struct MemoryCheckpointRegister {
    chain: Arc<Mutex<Vec<ContentHash>>>,
}

impl MemoryCheckpointRegister {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointRegister for MemoryCheckpointRegister {
    async fn record(&self, hash: &ContentHash) -> Result<(), CheckpointError> {
        let mut chain = self
            .chain
            .lock()
            .map_err(|e| CheckpointError::Unavailable(e.to_string()))?;
        if chain.last() == Some(hash) {
            return Ok(());
        }
        chain.push(hash.clone());
        debug!(%hash, height = chain.len(), "checkpoint recorded");
        Ok(())
    }

    async fn latest(&self) -> Result<Option<ContentHash>, CheckpointError> {
        Ok(self
            .chain
            .lock()
            .map_err(|e| CheckpointError::Unavailable(e.to_string()))?
            .last()
            .cloned())
    }

    async fn history(&self) -> Result<Vec<ContentHash>, CheckpointError> {
        Ok(self
            .chain
            .lock()
            .map_err(|e| CheckpointError::Unavailable(e.to_string()))?
            .clone())
    }
}
