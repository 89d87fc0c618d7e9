//! HTTP scrape adapter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use researcher_application::ports::scrape::{ScrapeClient, ScrapeError};

use super::retry::with_retries;

const USER_AGENT: &str = concat!("doc-researcher/", env!("CARGO_PKG_VERSION"));

pub struct HttpScrapeClient {
    http: Client,
    attempts: usize,
    backoff: Duration,
}

impl HttpScrapeClient {
    pub fn new(attempts: usize, backoff: Duration, request_timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            attempts,
            backoff,
        }
    }

    async fn request(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ScrapeError::Status(response.status().as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| ScrapeError::RequestFailed(e.to_string()))
    }
}

#[async_trait]
impl ScrapeClient for HttpScrapeClient {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let attempts = self.attempts;
        with_retries(attempts, self.backoff, || self.request(url))
            .await
            .map_err(|_| ScrapeError::RetriesExceeded { attempts })
    }
}
