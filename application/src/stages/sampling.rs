//! Sampling stage
//!
//! Opens the scraper cycle by picking one open document through the shared
//! round randomness. The processed flip is applied to the document file
//! only once the round commits, so a timed-out or split round re-samples
//! the same document instead of consuming a new one per attempt. No open
//! documents yields the none payload and the cycle ends without scraping.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use researcher_domain::{hash_canonical, keys, Document, ProcessingStatus, RoundId};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::lifecycle::sample_seeded;
use crate::ports::artifacts::ArtifactRepository;

pub struct SamplingStage {
    artifacts: Arc<dyn ArtifactRepository>,
}

impl SamplingStage {
    pub fn new(artifacts: Arc<dyn ArtifactRepository>) -> Self {
        Self { artifacts }
    }
}

fn mark_processed(documents: &mut [Document], url: &str) {
    for document in documents {
        if document.url == url {
            document.status = ProcessingStatus::Processed;
        }
    }
}

#[async_trait]
impl PipelineStage for SamplingStage {
    fn round(&self) -> RoundId {
        RoundId::Sampling
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let mut documents = self.artifacts.load_documents()?;
        let Some(sampled_url) =
            sample_seeded(&documents, ctx.synced_time, &ctx.randomness).map(|d| d.url.clone())
        else {
            debug!("no open documents to sample");
            return Ok(StageOutput::none());
        };

        // Hash the post-flip set; the file itself stays untouched until
        // the round commits.
        mark_processed(&mut documents, &sampled_url);
        info!(url = %sampled_url, "document sampled");

        let hash = hash_canonical(&documents)?;
        Ok(StageOutput::object(json!({
            keys::DOCUMENTS_HASH: hash.as_str(),
            keys::SAMPLED_DOC_URL: sampled_url,
        })))
    }

    async fn on_commit(&self, agreed: &Value) -> Result<(), StageError> {
        let Some(url) = agreed.get(keys::SAMPLED_DOC_URL).and_then(|v| v.as_str()) else {
            return Ok(());
        };
        let mut documents = self.artifacts.load_documents()?;
        mark_processed(&mut documents, url);
        self.artifacts.store_documents(&documents)?;
        debug!(%url, "sampled document marked processed");
        Ok(())
    }
}
