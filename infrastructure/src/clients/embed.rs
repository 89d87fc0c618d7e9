//! HTTP embedding adapter
//!
//! OpenAI-compatible embeddings endpoint: POST a batch of inputs, get one
//! vector per input back, in order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use researcher_application::ports::embed::{EmbedClient, EmbedError};

use super::retry::with_retries;

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f64>,
}

pub struct HttpEmbedClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    attempts: usize,
    backoff: Duration,
}

impl HttpEmbedClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
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
            model: model.into(),
            attempts,
            backoff,
        }
    }

    async fn request(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>, EmbedError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": chunks,
            }))
            .send()
            .await
            .map_err(|e| EmbedError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbedError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let decoded: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Decode(e.to_string()))?;
        if decoded.data.len() != chunks.len() {
            return Err(EmbedError::Decode(format!(
                "expected {} vectors, got {}",
                chunks.len(),
                decoded.data.len()
            )));
        }
        Ok(decoded.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbedClient for HttpEmbedClient {
    async fn embed(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>, EmbedError> {
        let attempts = self.attempts;
        with_retries(attempts, self.backoff, || self.request(chunks))
            .await
            .map_err(|_| EmbedError::RetriesExceeded { attempts })
    }
}
