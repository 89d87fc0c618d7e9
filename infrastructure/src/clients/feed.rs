//! HTTP query feed adapter
//!
//! Fetches the curated query list from a JSON endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use researcher_application::ports::feed::{FeedError, QueryFeed};
use researcher_domain::{parse_date, Query};

use super::retry::with_retries;

#[derive(Debug, Deserialize)]
struct FeedEntry {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publication_date: Option<String>,
}

pub struct HttpQueryFeed {
    http: Client,
    endpoint: String,
    attempts: usize,
    backoff: Duration,
}

impl HttpQueryFeed {
    pub fn new(
        endpoint: impl Into<String>,
        attempts: usize,
        backoff: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http: Client::builder()
                .timeout(request_timeout)
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            attempts,
            backoff,
        }
    }

    async fn request(&self) -> Result<Vec<FeedEntry>, FeedError> {
        let response = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| FeedError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FeedError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))
    }
}

#[async_trait]
impl QueryFeed for HttpQueryFeed {
    async fn fetch_queries(&self) -> Result<Vec<Query>, FeedError> {
        let attempts = self.attempts;
        let entries = with_retries(attempts, self.backoff, || self.request())
            .await
            .map_err(|_| FeedError::RetriesExceeded { attempts })?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let mut query = Query::new(entry.url);
                query.title = entry.title;
                query.publication_date = entry.publication_date.as_deref().and_then(parse_date);
                query
            })
            .collect())
    }
}
