//! Blob store port
//!
//! Content-addressed storage for published artifacts. Writing returns the
//! content hash of the stored bytes; reading takes the hash back.

use async_trait::async_trait;
use researcher_domain::ContentHash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(ContentHash),

    #[error("Store failed: {0}")]
    StoreFailed(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return their content hash.
    async fn put(&self, bytes: &[u8]) -> Result<ContentHash, BlobError>;

    /// Fetch the bytes behind a hash.
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, BlobError>;
}
