//! Sample query stage
//!
//! Picks the open query with the oldest publication date and proposes the
//! post-sample query hash together with the sampled URL. The processed
//! flip is applied to the query file only once the round commits; a
//! timed-out or split round re-samples from the untouched file, so no
//! query is silently consumed. An exhausted query set yields the none
//! payload, which ends the documents-manager cycle gracefully.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use researcher_domain::{hash_canonical, keys, ProcessingStatus, Query, RoundId};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::lifecycle::sample_oldest;
use crate::ports::artifacts::ArtifactRepository;

pub struct SampleQueryStage {
    artifacts: Arc<dyn ArtifactRepository>,
}

impl SampleQueryStage {
    pub fn new(artifacts: Arc<dyn ArtifactRepository>) -> Self {
        Self { artifacts }
    }
}

fn mark_processed(queries: &mut [Query], url: &str) {
    for query in queries {
        if query.url == url {
            query.status = ProcessingStatus::Processed;
        }
    }
}

#[async_trait]
impl PipelineStage for SampleQueryStage {
    fn round(&self) -> RoundId {
        RoundId::SampleQuery
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let mut queries = self.artifacts.load_queries()?;
        let Some(sampled_url) = sample_oldest(&queries, ctx.synced_time).map(|q| q.url.clone())
        else {
            debug!("no open queries to sample");
            return Ok(StageOutput::none());
        };

        // Hash the post-flip set; the file itself stays untouched until
        // the round commits.
        mark_processed(&mut queries, &sampled_url);
        info!(url = %sampled_url, "query sampled");

        let hash = hash_canonical(&queries)?;
        Ok(StageOutput::object(json!({
            keys::QUERIES_HASH: hash.as_str(),
            keys::SAMPLED_QUERY_URL: sampled_url,
        })))
    }

    async fn on_commit(&self, agreed: &Value) -> Result<(), StageError> {
        let Some(url) = agreed.get(keys::SAMPLED_QUERY_URL).and_then(|v| v.as_str()) else {
            return Ok(());
        };
        let mut queries = self.artifacts.load_queries()?;
        mark_processed(&mut queries, url);
        self.artifacts.store_queries(&queries)?;
        debug!(%url, "sampled query marked processed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{context, MemoryArtifacts};
    use chrono::{TimeZone, Utc};
    use researcher_domain::SynchronizedStore;

    fn seeded_artifacts() -> Arc<MemoryArtifacts> {
        let artifacts = Arc::new(MemoryArtifacts::default());
        artifacts
            .store_queries(&[
                Query::new("https://newer.example")
                    .with_publication_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                Query::new("https://older.example")
                    .with_publication_date(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()),
            ])
            .unwrap();
        artifacts
    }

    #[tokio::test]
    async fn test_samples_oldest_and_flips_on_commit() {
        let artifacts = seeded_artifacts();
        let stage = SampleQueryStage::new(artifacts.clone());
        let store = SynchronizedStore::new();
        let out = stage
            .execute(&context(&store, &[keys::QUERIES_HASH]))
            .await
            .unwrap();

        let value = out.payload().value();
        assert_eq!(
            value.get(keys::SAMPLED_QUERY_URL).and_then(|v| v.as_str()),
            Some("https://older.example")
        );

        stage.on_commit(&value).await.unwrap();
        let stored = artifacts.load_queries().unwrap();
        let sampled = stored
            .iter()
            .find(|q| q.url == "https://older.example")
            .unwrap();
        assert_eq!(sampled.status, ProcessingStatus::Processed);
        // The proposed hash is the hash of the committed file.
        let committed = hash_canonical(&stored).unwrap();
        assert_eq!(
            value.get(keys::QUERIES_HASH).and_then(|v| v.as_str()),
            Some(committed.as_str())
        );
    }

    #[tokio::test]
    async fn test_failed_round_resamples_the_same_query() {
        let artifacts = seeded_artifacts();
        let stage = SampleQueryStage::new(artifacts.clone());
        let store = SynchronizedStore::new();

        // Two attempts with no commit in between, as after a timeout or a
        // split round.
        let first = stage
            .execute(&context(&store, &[keys::QUERIES_HASH]))
            .await
            .unwrap();
        let second = stage
            .execute(&context(&store, &[keys::QUERIES_HASH]))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first
                .payload()
                .value()
                .get(keys::SAMPLED_QUERY_URL)
                .and_then(|v| v.as_str()),
            Some("https://older.example")
        );

        // Nothing was consumed by the failed attempts.
        let stored = artifacts.load_queries().unwrap();
        assert!(stored
            .iter()
            .all(|q| q.status == ProcessingStatus::Unprocessed));
    }

    #[tokio::test]
    async fn test_exhausted_queries_yield_none() {
        let artifacts = Arc::new(MemoryArtifacts::default());
        let mut done = Query::new("https://done.example");
        done.status = ProcessingStatus::Processed;
        artifacts.store_queries(&[done]).unwrap();

        let stage = SampleQueryStage::new(artifacts);
        let store = SynchronizedStore::new();
        let out = stage
            .execute(&context(&store, &[keys::QUERIES_HASH]))
            .await
            .unwrap();
        assert!(out.payload().is_none_payload());
    }
}
