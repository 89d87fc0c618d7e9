//! HTTP search adapter
//!
//! Talks to a SerpAPI-style search endpoint and maps its organic results
//! onto search hits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use researcher_application::ports::search::{SearchClient, SearchError, SearchHit};
use researcher_domain::parse_date;

use super::retry::with_retries;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

pub struct HttpSearchClient {
    http: Client,
    endpoint: String,
    api_key: String,
    attempts: usize,
    backoff: Duration,
}

impl HttpSearchClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
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
            api_key: api_key.into(),
            attempts,
            backoff,
        }
    }

    async fn request(&self, query: &str, num: usize) -> Result<SearchResponse, SearchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("num", &num.to_string()),
                ("api_key", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(SearchError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(SearchError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }
        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let attempts = self.attempts;
        let response = with_retries(attempts, self.backoff, || self.request(query, max_results))
            .await
            .map_err(|_| SearchError::RetriesExceeded { attempts })?;

        Ok(response
            .organic_results
            .into_iter()
            .take(max_results)
            .map(|result| SearchHit {
                url: result.link,
                title: result.title,
                description: result.snippet,
                publisher: result.source,
                publication_date: result.date.as_deref().and_then(parse_date),
            })
            .collect())
    }
}
