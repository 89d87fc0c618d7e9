//! Search engine port
//!
//! Defines the interface for turning a query into candidate document URLs.
//! Implementations (adapters) live in the infrastructure layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited by search provider")]
    RateLimited,

    #[error("Response could not be decoded: {0}")]
    Decode(String),

    #[error("Gave up after {attempts} attempts")]
    RetriesExceeded { attempts: usize },
}

/// A single search result, before it becomes a tracked document.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a search and return up to `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}
