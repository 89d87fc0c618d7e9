//! Checkpoint chain service
//!
//! Publishes artifact sets under a content-addressed manifest and resumes
//! from the latest checkpoint. Every byte fetched back is re-hashed and
//! checked against the hash it was requested under.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use researcher_domain::{ArtifactKind, ContentHash, DomainError, Manifest};

use crate::ports::blob::{BlobError, BlobStore};
use crate::ports::checkpoint::{CheckpointError, CheckpointRegister};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Content hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        expected: ContentHash,
        actual: ContentHash,
    },

    #[error("Manifest could not be decoded: {0}")]
    Decode(String),
}

#[derive(Clone)]
pub struct CheckpointChain {
    blobs: Arc<dyn BlobStore>,
    register: Arc<dyn CheckpointRegister>,
}

impl CheckpointChain {
    pub fn new(blobs: Arc<dyn BlobStore>, register: Arc<dyn CheckpointRegister>) -> Self {
        Self { blobs, register }
    }

    /// Store each artifact, build the manifest over their hashes and store
    /// the manifest. The returned hash is only proposed at this point;
    /// [`CheckpointChain::anchor`] appends it to the register once the
    /// group has agreed on it.
    pub async fn publish_set(
        &self,
        artifacts: &[(ArtifactKind, Vec<u8>)],
    ) -> Result<ContentHash, ChainError> {
        let mut manifest = Manifest::new();
        for (kind, bytes) in artifacts {
            let hash = self.blobs.put(bytes).await?;
            debug!(artifact = kind.manifest_name(), %hash, "artifact stored");
            manifest.insert(*kind, hash);
        }

        let manifest_bytes = researcher_domain::to_canonical_json(&manifest)?;
        let stored = self.blobs.put(manifest_bytes.as_bytes()).await?;
        let expected = manifest.hash()?;
        if stored != expected {
            return Err(ChainError::HashMismatch {
                expected,
                actual: stored,
            });
        }

        info!(manifest = %stored, artifacts = artifacts.len(), "artifact set stored");
        Ok(stored)
    }

    /// Append an agreed manifest hash to the checkpoint register. Never
    /// called for a hash the group has not finalized a round on.
    pub async fn anchor(&self, manifest_hash: &ContentHash) -> Result<(), ChainError> {
        self.register.record(manifest_hash).await?;
        info!(manifest = %manifest_hash, "checkpoint anchored");
        Ok(())
    }

    /// Load the manifest behind the latest checkpoint, if the chain is
    /// non-empty.
    pub async fn resume(&self) -> Result<Option<(ContentHash, Manifest)>, ChainError> {
        let Some(latest) = self.register.latest().await? else {
            return Ok(None);
        };
        let bytes = self.fetch_verified(&latest).await?;
        let manifest: Manifest = serde_json::from_slice(&bytes)
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        info!(manifest = %latest, "resuming from checkpoint");
        Ok(Some((latest, manifest)))
    }

    /// Fetch one artifact named by a manifest. `None` when the manifest has
    /// no entry for that kind.
    pub async fn fetch_artifact(
        &self,
        manifest: &Manifest,
        kind: ArtifactKind,
    ) -> Result<Option<Vec<u8>>, ChainError> {
        let Some(hash) = manifest.get(kind) else {
            return Ok(None);
        };
        Ok(Some(self.fetch_verified(hash).await?))
    }

    async fn fetch_verified(&self, hash: &ContentHash) -> Result<Vec<u8>, ChainError> {
        let bytes = self.blobs.get(hash).await?;
        let actual = ContentHash::of_bytes(&bytes);
        if &actual != hash {
            return Err(ChainError::HashMismatch {
                expected: hash.clone(),
                actual,
            });
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryBlobs {
        blobs: Mutex<BTreeMap<ContentHash, Vec<u8>>>,
    }

    #[async_trait]
    impl BlobStore for MemoryBlobs {
        async fn put(&self, bytes: &[u8]) -> Result<ContentHash, BlobError> {
            let hash = ContentHash::of_bytes(bytes);
            self.blobs
                .lock()
                .unwrap()
                .insert(hash.clone(), bytes.to_vec());
            Ok(hash)
        }

        async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, BlobError> {
            self.blobs
                .lock()
                .unwrap()
                .get(hash)
                .cloned()
                .ok_or_else(|| BlobError::NotFound(hash.clone()))
        }
    }

    #[derive(Default)]
    struct MemoryRegister {
        chain: Mutex<Vec<ContentHash>>,
    }

    #[async_trait]
    impl CheckpointRegister for MemoryRegister {
        async fn record(&self, hash: &ContentHash) -> Result<(), CheckpointError> {
            self.chain.lock().unwrap().push(hash.clone());
            Ok(())
        }

        async fn latest(&self) -> Result<Option<ContentHash>, CheckpointError> {
            Ok(self.chain.lock().unwrap().last().cloned())
        }

        async fn history(&self) -> Result<Vec<ContentHash>, CheckpointError> {
            Ok(self.chain.lock().unwrap().clone())
        }
    }

    fn chain() -> CheckpointChain {
        CheckpointChain::new(
            Arc::new(MemoryBlobs::default()),
            Arc::new(MemoryRegister::default()),
        )
    }

    #[tokio::test]
    async fn test_publish_then_anchor_then_resume_round_trips() {
        let chain = chain();
        let manifest_hash = chain
            .publish_set(&[
                (ArtifactKind::Documents, b"[]".to_vec()),
                (ArtifactKind::Embeddings, b"[]".to_vec()),
            ])
            .await
            .unwrap();
        chain.anchor(&manifest_hash).await.unwrap();

        let (latest, manifest) = chain.resume().await.unwrap().unwrap();
        assert_eq!(latest, manifest_hash);

        let docs = chain
            .fetch_artifact(&manifest, ArtifactKind::Documents)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(docs, b"[]".to_vec());
        assert!(chain
            .fetch_artifact(&manifest, ArtifactKind::Queries)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resume_on_empty_chain_is_none() {
        assert!(chain().resume().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publish_alone_records_no_checkpoint() {
        let register = Arc::new(MemoryRegister::default());
        let chain = CheckpointChain::new(Arc::new(MemoryBlobs::default()), register.clone());

        let manifest_hash = chain
            .publish_set(&[(ArtifactKind::Documents, b"[]".to_vec())])
            .await
            .unwrap();
        // The blobs exist, the register does not move until the hash is
        // anchored.
        assert!(register.chain.lock().unwrap().is_empty());
        assert!(chain.resume().await.unwrap().is_none());

        chain.anchor(&manifest_hash).await.unwrap();
        assert_eq!(chain.resume().await.unwrap().unwrap().0, manifest_hash);
    }

    #[tokio::test]
    async fn test_tampered_blob_is_rejected() {
        let blobs = Arc::new(MemoryBlobs::default());
        let register = Arc::new(MemoryRegister::default());
        let chain = CheckpointChain::new(blobs.clone(), register.clone());

        let hash = chain
            .publish_set(&[(ArtifactKind::Documents, b"[]".to_vec())])
            .await
            .unwrap();
        chain.anchor(&hash).await.unwrap();
        blobs
            .blobs
            .lock()
            .unwrap()
            .insert(hash.clone(), b"tampered".to_vec());

        assert!(matches!(
            chain.resume().await,
            Err(ChainError::HashMismatch { .. })
        ));
    }
}
