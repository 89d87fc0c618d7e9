//! Update files stage
//!
//! Brings the local artifact files in line with the latest checkpoint. A
//! participant that restarted or fell behind refetches any artifact whose
//! local hash differs from the manifest entry, then proposes the resulting
//! document and embedding hashes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use researcher_domain::{
    hash_canonical, ArtifactKind, Document, DocumentMapping, EmbeddingsTable, Manifest, Query,
    RoundId, keys,
};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::chain::CheckpointChain;
use crate::ports::artifacts::ArtifactRepository;

pub struct UpdateFilesStage {
    chain: CheckpointChain,
    artifacts: Arc<dyn ArtifactRepository>,
}

impl UpdateFilesStage {
    pub fn new(chain: CheckpointChain, artifacts: Arc<dyn ArtifactRepository>) -> Self {
        Self { chain, artifacts }
    }

    async fn sync_artifact<T>(
        &self,
        manifest: &Manifest,
        kind: ArtifactKind,
        local: &T,
        store: impl FnOnce(T) -> Result<(), StageError>,
    ) -> Result<bool, StageError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let Some(expected) = manifest.get(kind) else {
            return Ok(false);
        };
        if &hash_canonical(local)? == expected {
            return Ok(false);
        }
        let Some(bytes) = self.chain.fetch_artifact(manifest, kind).await? else {
            return Ok(false);
        };
        match serde_json::from_slice::<T>(&bytes) {
            Ok(fetched) => {
                store(fetched)?;
                debug!(artifact = kind.manifest_name(), "artifact refetched from checkpoint");
                Ok(true)
            }
            Err(e) => {
                warn!(artifact = kind.manifest_name(), error = %e, "checkpointed artifact undecodable, keeping local copy");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl PipelineStage for UpdateFilesStage {
    fn round(&self) -> RoundId {
        RoundId::UpdateFiles
    }

    async fn execute(&self, _ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let resumed = match self.chain.resume().await {
            Ok(resumed) => resumed,
            Err(e) => {
                warn!(error = %e, "checkpoint chain unavailable");
                return Ok(StageOutput::none());
            }
        };

        if let Some((_, manifest)) = resumed {
            let artifacts = self.artifacts.clone();
            self.sync_artifact::<Vec<Document>>(
                &manifest,
                ArtifactKind::Documents,
                &artifacts.load_documents()?,
                |docs| Ok(artifacts.store_documents(&docs)?),
            )
            .await?;
            self.sync_artifact::<EmbeddingsTable>(
                &manifest,
                ArtifactKind::Embeddings,
                &artifacts.load_embeddings()?,
                |table| Ok(artifacts.store_embeddings(&table)?),
            )
            .await?;
            self.sync_artifact::<Vec<Query>>(
                &manifest,
                ArtifactKind::Queries,
                &artifacts.load_queries()?,
                |queries| Ok(artifacts.store_queries(&queries)?),
            )
            .await?;
            self.sync_artifact::<Vec<DocumentMapping>>(
                &manifest,
                ArtifactKind::UrlsToDoc,
                &artifacts.load_mappings()?,
                |mappings| Ok(artifacts.store_mappings(&mappings)?),
            )
            .await?;
        }

        let documents_hash = hash_canonical(&self.artifacts.load_documents()?)?;
        let embeddings_hash = hash_canonical(&self.artifacts.load_embeddings()?)?;
        Ok(StageOutput::object(json!({
            keys::DOCUMENTS_HASH: documents_hash.as_str(),
            keys::EMBEDDINGS_HASH: embeddings_hash.as_str(),
        })))
    }
}
