//! Publish stage
//!
//! Closes the cycle: verifies the local artifacts still match the agreed
//! hashes, refreshes the URL-to-artifact mapping, stores the artifact set
//! in the blob store and proposes the manifest hash for checkpointing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use researcher_domain::{
    hash_canonical, keys, ArtifactKind, ContentHash, Lifecycle, ProcessingStatus, RoundId,
};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::chain::CheckpointChain;
use crate::ports::artifacts::ArtifactRepository;

pub struct PublishStage {
    chain: CheckpointChain,
    artifacts: Arc<dyn ArtifactRepository>,
}

impl PublishStage {
    pub fn new(chain: CheckpointChain, artifacts: Arc<dyn ArtifactRepository>) -> Self {
        Self { chain, artifacts }
    }

    /// Point every frozen document's mapping entry at the artifact that
    /// now contains it.
    fn refresh_mappings(
        &self,
        documents_hash: &ContentHash,
        now: i64,
    ) -> Result<(), StageError> {
        let documents = self.artifacts.load_documents()?;
        let mut mappings = self.artifacts.load_mappings()?;
        for document in documents.iter().filter(|d| d.is_frozen(now)) {
            match mappings.iter_mut().find(|m| m.url == document.url) {
                Some(entry) => {
                    entry.ipfs_hash = Some(documents_hash.as_str().to_string());
                    entry.status = ProcessingStatus::Processed;
                }
                None => {
                    let mut entry = researcher_domain::DocumentMapping::new(document.url.clone())
                        .with_ipfs_hash(documents_hash.as_str());
                    entry.status = ProcessingStatus::Processed;
                    mappings.push(entry);
                }
            }
        }
        self.artifacts.store_mappings(&mappings)?;
        Ok(())
    }
}

#[async_trait]
impl PipelineStage for PublishStage {
    fn round(&self) -> RoundId {
        RoundId::Publish
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let documents = self.artifacts.load_documents()?;
        let embeddings = self.artifacts.load_embeddings()?;
        let documents_hash = hash_canonical(&documents)?;
        let embeddings_hash = hash_canonical(&embeddings)?;

        let agreed_documents = ctx.reader.get_str(keys::DOCUMENTS_HASH)?.unwrap_or_default();
        let agreed_embeddings = ctx.reader.get_str(keys::EMBEDDINGS_HASH)?.unwrap_or_default();
        if documents_hash.as_str() != agreed_documents
            || embeddings_hash.as_str() != agreed_embeddings
        {
            warn!("local artifacts diverged from agreed hashes");
            return Ok(StageOutput::error("artifact hash mismatch"));
        }

        self.refresh_mappings(&documents_hash, ctx.synced_time)?;

        let queries = self.artifacts.load_queries()?;
        let mappings = self.artifacts.load_mappings()?;
        let set = [
            (
                ArtifactKind::Documents,
                researcher_domain::to_canonical_json(&documents)?.into_bytes(),
            ),
            (
                ArtifactKind::Embeddings,
                researcher_domain::to_canonical_json(&embeddings)?.into_bytes(),
            ),
            (
                ArtifactKind::UrlsToDoc,
                researcher_domain::to_canonical_json(&mappings)?.into_bytes(),
            ),
            (
                ArtifactKind::Queries,
                researcher_domain::to_canonical_json(&queries)?.into_bytes(),
            ),
        ];

        match self.chain.publish_set(&set).await {
            Ok(manifest_hash) => {
                info!(manifest = %manifest_hash, "artifact set published");
                Ok(StageOutput::object(json!({
                    keys::MANIFEST_HASH: manifest_hash.as_str(),
                })))
            }
            Err(e) => {
                warn!(error = %e, "publish failed");
                Ok(StageOutput::error(e.to_string()))
            }
        }
    }
}
