//! Update queries stage
//!
//! Pulls the current query set from the feed and merges new entries into
//! the local queries artifact. A failing feed yields the none payload,
//! which the round maps to its fetch-error event.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use researcher_domain::{hash_canonical, keys, RoundId};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::lifecycle::merge_new;
use crate::ports::artifacts::ArtifactRepository;
use crate::ports::feed::QueryFeed;

pub struct UpdateQueriesStage {
    feed: Arc<dyn QueryFeed>,
    artifacts: Arc<dyn ArtifactRepository>,
}

impl UpdateQueriesStage {
    pub fn new(feed: Arc<dyn QueryFeed>, artifacts: Arc<dyn ArtifactRepository>) -> Self {
        Self { feed, artifacts }
    }
}

#[async_trait]
impl PipelineStage for UpdateQueriesStage {
    fn round(&self) -> RoundId {
        RoundId::UpdateQueries
    }

    async fn execute(&self, _ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let incoming = match self.feed.fetch_queries().await {
            Ok(queries) => queries,
            Err(e) => {
                warn!(error = %e, "query feed unavailable");
                return Ok(StageOutput::none());
            }
        };

        let mut queries = self.artifacts.load_queries()?;
        let added = merge_new(&mut queries, incoming);
        if added > 0 {
            self.artifacts.store_queries(&queries)?;
        }
        debug!(added, total = queries.len(), "queries updated");

        let hash = hash_canonical(&queries)?;
        Ok(StageOutput::object(json!({
            keys::QUERIES_HASH: hash.as_str(),
        })))
    }
}
