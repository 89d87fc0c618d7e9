//! Scraping ports
//!
//! [`ScrapeClient`] fetches raw page bodies; [`TextExtractor`] turns markup
//! into plain text blocks. Both are implemented in the infrastructure layer,
//! keeping HTTP and HTML parsing out of the pipeline stages.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected status code {0}")]
    Status(u16),

    #[error("Gave up after {attempts} attempts")]
    RetriesExceeded { attempts: usize },
}

#[async_trait]
pub trait ScrapeClient: Send + Sync {
    /// Fetch the raw body of a page.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Extracts readable text blocks from an HTML document.
pub trait TextExtractor: Send + Sync {
    /// Return the visible text of the page as paragraph-sized blocks, in
    /// document order. Markup-only pages yield an empty vector.
    fn extract(&self, html: &str) -> Vec<String>;
}
