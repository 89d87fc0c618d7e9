//! HTTP gateway blob store
//!
//! Content-addressed gateway with `PUT /blobs/{hash}` and
//! `GET /blobs/{hash}`. The hash is computed locally before upload and
//! verified again on download.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use researcher_application::ports::blob::{BlobError, BlobStore};
use researcher_domain::ContentHash;

use crate::clients::retry::with_retries;

pub struct HttpBlobStore {
    http: Client,
    endpoint: String,
    attempts: usize,
    backoff: Duration,
}

impl HttpBlobStore {
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
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            attempts,
            backoff,
        }
    }

    fn blob_url(&self, hash: &ContentHash) -> String {
        format!("{}/blobs/{}", self.endpoint, hash)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentHash, BlobError> {
        let hash = ContentHash::of_bytes(bytes);
        let url = self.blob_url(&hash);
        with_retries(self.attempts, self.backoff, || async {
            let response = self
                .http
                .put(&url)
                .body(bytes.to_vec())
                .send()
                .await
                .map_err(|e| BlobError::StoreFailed(e.to_string()))?;
            if !response.status().is_success() {
                return Err(BlobError::StoreFailed(format!(
                    "status {}",
                    response.status()
                )));
            }
            Ok(())
        })
        .await?;
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, BlobError> {
        let url = self.blob_url(hash);
        let bytes = with_retries(self.attempts, self.backoff, || async {
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| BlobError::FetchFailed(e.to_string()))?;
            if response.status().as_u16() == 404 {
                return Err(BlobError::NotFound(hash.clone()));
            }
            if !response.status().is_success() {
                return Err(BlobError::FetchFailed(format!(
                    "status {}",
                    response.status()
                )));
            }
            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| BlobError::FetchFailed(e.to_string()))
        })
        .await?;

        let actual = ContentHash::of_bytes(&bytes);
        if &actual != hash {
            return Err(BlobError::FetchFailed(format!(
                "gateway returned wrong content for {hash}"
            )));
        }
        Ok(bytes)
    }
}
