//! Check documents stage
//!
//! Counts the documents still open for processing at the synchronized
//! time. The agreed count drives the branch between discovering new
//! material and handing over to the scraper.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use researcher_domain::{keys, RoundId};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::lifecycle::num_unfrozen;
use crate::ports::artifacts::ArtifactRepository;

pub struct CheckDocumentsStage {
    artifacts: Arc<dyn ArtifactRepository>,
}

impl CheckDocumentsStage {
    pub fn new(artifacts: Arc<dyn ArtifactRepository>) -> Self {
        Self { artifacts }
    }
}

#[async_trait]
impl PipelineStage for CheckDocumentsStage {
    fn round(&self) -> RoundId {
        RoundId::CheckDocuments
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let documents = self.artifacts.load_documents()?;
        let unprocessed = num_unfrozen(&documents, ctx.synced_time);
        debug!(unprocessed, total = documents.len(), "documents checked");
        Ok(StageOutput::object(json!({
            keys::NUM_UNPROCESSED: unprocessed,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{context, MemoryArtifacts};
    use researcher_domain::{Document, ProcessingStatus, SynchronizedStore};

    #[tokio::test]
    async fn test_counts_only_open_documents() {
        let artifacts = Arc::new(MemoryArtifacts::default());
        let mut processed = Document::new("https://done.example");
        processed.status = ProcessingStatus::Processed;
        let mut blacklisted = Document::new("https://blocked.example");
        blacklisted.blacklist_forever();
        artifacts
            .store_documents(&[
                processed,
                blacklisted,
                Document::new("https://open.example"),
            ])
            .unwrap();

        let stage = CheckDocumentsStage::new(artifacts);
        let store = SynchronizedStore::new();
        let out = stage.execute(&context(&store, &[])).await.unwrap();
        assert_eq!(
            out.payload().value().get(keys::NUM_UNPROCESSED),
            Some(&serde_json::json!(1))
        );
    }
}
