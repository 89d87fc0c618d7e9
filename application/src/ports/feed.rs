//! Query feed port
//!
//! Source of new research queries, e.g. a curated endpoint or a local file.

use async_trait::async_trait;
use researcher_domain::Query;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response could not be decoded: {0}")]
    Decode(String),

    #[error("Gave up after {attempts} attempts")]
    RetriesExceeded { attempts: usize },
}

#[async_trait]
pub trait QueryFeed: Send + Sync {
    /// Fetch the current set of queries from the feed.
    async fn fetch_queries(&self) -> Result<Vec<Query>, FeedError>;
}
