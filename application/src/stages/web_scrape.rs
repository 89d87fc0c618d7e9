//! Web scrape stage
//!
//! Fetches the body of the sampled document. A fetch that exhausts its
//! retries blacklists the document for the configured cooldown and
//! proposes an error payload, so the group agrees on skipping it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use researcher_domain::{keys, RoundId};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::config::ExecutionParams;
use crate::ports::artifacts::ArtifactRepository;
use crate::ports::scrape::ScrapeClient;

pub struct WebScrapeStage {
    scrape: Arc<dyn ScrapeClient>,
    artifacts: Arc<dyn ArtifactRepository>,
    params: ExecutionParams,
}

impl WebScrapeStage {
    pub fn new(
        scrape: Arc<dyn ScrapeClient>,
        artifacts: Arc<dyn ArtifactRepository>,
        params: ExecutionParams,
    ) -> Self {
        Self {
            scrape,
            artifacts,
            params,
        }
    }

    fn blacklist(&self, url: &str, now: i64) -> Result<(), StageError> {
        let mut documents = self.artifacts.load_documents()?;
        for document in &mut documents {
            if document.url == url {
                document.blacklist_until(now + self.params.blacklist_cooldown_secs);
            }
        }
        self.artifacts.store_documents(&documents)?;
        Ok(())
    }
}

#[async_trait]
impl PipelineStage for WebScrapeStage {
    fn round(&self) -> RoundId {
        RoundId::WebScrape
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let url = ctx
            .reader
            .get_str(keys::SAMPLED_DOC_URL)?
            .unwrap_or_default()
            .to_string();

        match self.scrape.fetch(&url).await {
            Ok(body) => {
                info!(%url, bytes = body.len(), "page fetched");
                Ok(StageOutput::object(json!({
                    keys::WEB_SCRAPE_DATA: body,
                })))
            }
            Err(e) => {
                warn!(%url, error = %e, "scrape failed, blacklisting document");
                self.blacklist(&url, ctx.synced_time)?;
                Ok(StageOutput::error(e.to_string()))
            }
        }
    }
}
