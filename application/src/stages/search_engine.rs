//! Search engine stage
//!
//! Runs the sampled query against the search client and merges the hits
//! into the documents artifact as unprocessed entries. A failing search
//! yields the none payload, mapped to the update-failed event.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use researcher_domain::{hash_canonical, keys, parse_date, Document, RoundId};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::config::ExecutionParams;
use crate::lifecycle::merge_new;
use crate::ports::artifacts::ArtifactRepository;
use crate::ports::search::{SearchClient, SearchHit};

pub struct SearchEngineStage {
    search: Arc<dyn SearchClient>,
    artifacts: Arc<dyn ArtifactRepository>,
    params: ExecutionParams,
}

impl SearchEngineStage {
    pub fn new(
        search: Arc<dyn SearchClient>,
        artifacts: Arc<dyn ArtifactRepository>,
        params: ExecutionParams,
    ) -> Self {
        Self {
            search,
            artifacts,
            params,
        }
    }
}

fn hit_to_document(hit: SearchHit) -> Document {
    let mut doc = Document::new(hit.url);
    doc.title = hit.title;
    doc.description = hit.description;
    doc.publisher = hit.publisher;
    doc.publication_date = hit.publication_date;
    doc
}

#[async_trait]
impl PipelineStage for SearchEngineStage {
    fn round(&self) -> RoundId {
        RoundId::SearchEngine
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let sampled_url = ctx.reader.get_strict(keys::SAMPLED_QUERY_URL)?;
        let sampled_url = sampled_url.as_str().unwrap_or_default().to_string();

        // The store holds only the URL; the query text lives in the artifact.
        let queries = self.artifacts.load_queries()?;
        let search_text = queries
            .iter()
            .find(|q| q.url == sampled_url)
            .map(|q| q.search_text().to_string())
            .unwrap_or_else(|| sampled_url.clone());

        let hits = match self
            .search
            .search(&search_text, self.params.search_results_per_query)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %search_text, error = %e, "search failed");
                return Ok(StageOutput::none());
            }
        };

        let mut documents = self.artifacts.load_documents()?;
        let added = merge_new(
            &mut documents,
            hits.into_iter().map(hit_to_document).collect(),
        );
        if added > 0 {
            self.artifacts.store_documents(&documents)?;
        }
        info!(query = %search_text, added, "search results merged");

        let hash = hash_canonical(&documents)?;
        Ok(StageOutput::object(json!({
            keys::DOCUMENTS_HASH: hash.as_str(),
        })))
    }
}

/// Build a search hit from loosely-typed provider fields.
pub fn hit_from_fields(
    url: String,
    title: Option<String>,
    description: Option<String>,
    publisher: Option<String>,
    publication_date: Option<&str>,
) -> SearchHit {
    SearchHit {
        url,
        title,
        description,
        publisher,
        publication_date: publication_date.and_then(parse_date),
    }
}
