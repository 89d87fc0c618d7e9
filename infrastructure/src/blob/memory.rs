//! In-memory blob store
//!
//! Backs local multi-participant runs and tests. Cloning shares the
//! underlying map, so one instance can serve every participant.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use researcher_application::ports::blob::{BlobError, BlobStore};
use researcher_domain::ContentHash;

#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<BTreeMap<ContentHash, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentHash, BlobError> {
        let hash = ContentHash::of_bytes(bytes);
        self.blobs
            .lock()
            .map_err(|e| BlobError::StoreFailed(e.to_string()))?
            .insert(hash.clone(), bytes.to_vec());
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .lock()
            .map_err(|e| BlobError::FetchFailed(e.to_string()))?
            .get(hash)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(hash.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_is_content_addressed() {
        let store = MemoryBlobStore::new();
        let first = store.put(b"payload").await.unwrap();
        let second = store.put(b"payload").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&first).await.unwrap(), b"payload".to_vec());
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let store = MemoryBlobStore::new();
        let absent = ContentHash::of_bytes(b"absent");
        assert!(matches!(
            store.get(&absent).await,
            Err(BlobError::NotFound(_))
        ));
    }
}
