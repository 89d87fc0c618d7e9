//! Embedding port

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding operations
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response could not be decoded: {0}")]
    Decode(String),

    #[error("Gave up after {attempts} attempts")]
    RetriesExceeded { attempts: usize },
}

#[async_trait]
pub trait EmbedClient: Send + Sync {
    /// Embed a batch of text chunks. The returned vectors are aligned
    /// pairwise with the input.
    async fn embed(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>, EmbedError>;
}
