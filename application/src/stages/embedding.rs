//! Embedding stage
//!
//! Embeds the sampled document's text chunks that are not yet in the
//! embeddings table and proposes the updated table hash. An embedding
//! provider that exhausts its retries yields an error payload.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use researcher_domain::{hash_canonical, keys, RoundId};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::ports::artifacts::ArtifactRepository;
use crate::ports::embed::EmbedClient;

pub struct EmbeddingStage {
    embed: Arc<dyn EmbedClient>,
    artifacts: Arc<dyn ArtifactRepository>,
}

impl EmbeddingStage {
    pub fn new(embed: Arc<dyn EmbedClient>, artifacts: Arc<dyn ArtifactRepository>) -> Self {
        Self { embed, artifacts }
    }
}

#[async_trait]
impl PipelineStage for EmbeddingStage {
    fn round(&self) -> RoundId {
        RoundId::Embedding
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let url = ctx
            .reader
            .get_str(keys::SAMPLED_DOC_URL)?
            .unwrap_or_default()
            .to_string();

        let documents = self.artifacts.load_documents()?;
        let chunks: Vec<String> = documents
            .iter()
            .find(|d| d.url == url)
            .and_then(|d| d.text_chunks.clone())
            .unwrap_or_default();

        let mut table = self.artifacts.load_embeddings()?;
        let new_chunks: Vec<String> = chunks
            .into_iter()
            .filter(|chunk| !table.contains_chunk(chunk))
            .collect();

        if new_chunks.is_empty() {
            debug!(%url, "all chunks already embedded");
        } else {
            let vectors = match self.embed.embed(&new_chunks).await {
                Ok(vectors) => vectors,
                Err(e) => {
                    warn!(%url, error = %e, "embedding failed");
                    return Ok(StageOutput::error(e.to_string()));
                }
            };
            let added = table.merge(&new_chunks, &vectors)?;
            self.artifacts.store_embeddings(&table)?;
            info!(%url, added, "chunks embedded");
        }

        let hash = hash_canonical(&table)?;
        Ok(StageOutput::object(json!({
            keys::EMBEDDINGS_HASH: hash.as_str(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::embed::EmbedError;
    use crate::stages::testing::{context, MemoryArtifacts};
    use researcher_domain::{Document, SynchronizedStore};
    use serde_json::json;
    use std::collections::BTreeMap;

    struct UnitEmbed;

    #[async_trait]
    impl EmbedClient for UnitEmbed {
        async fn embed(&self, chunks: &[String]) -> Result<Vec<Vec<f64>>, EmbedError> {
            Ok(chunks.iter().map(|c| vec![c.len() as f64]).collect())
        }
    }

    struct FailingEmbed;

    #[async_trait]
    impl EmbedClient for FailingEmbed {
        async fn embed(&self, _chunks: &[String]) -> Result<Vec<Vec<f64>>, EmbedError> {
            Err(EmbedError::RetriesExceeded { attempts: 3 })
        }
    }

    fn store_with_sampled_doc() -> SynchronizedStore {
        let mut store = SynchronizedStore::new();
        store.commit(
            3,
            RoundId::ProcessHtml,
            BTreeMap::from([(
                keys::SAMPLED_DOC_URL.to_string(),
                json!("https://doc.example"),
            )]),
            700,
        );
        store
    }

    fn artifacts_with_chunks(chunks: &[&str]) -> Arc<MemoryArtifacts> {
        let artifacts = Arc::new(MemoryArtifacts::default());
        let mut doc = Document::new("https://doc.example");
        doc.text_chunks = Some(chunks.iter().map(|c| c.to_string()).collect());
        artifacts.store_documents(&[doc]).unwrap();
        artifacts
    }

    #[tokio::test]
    async fn test_new_chunks_are_embedded_and_merged() {
        let artifacts = artifacts_with_chunks(&["alpha", "beta"]);
        let stage = EmbeddingStage::new(Arc::new(UnitEmbed), artifacts.clone());
        let store = store_with_sampled_doc();

        let out = stage
            .execute(&context(&store, &[keys::SAMPLED_DOC_URL]))
            .await
            .unwrap();

        let table = artifacts.load_embeddings().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            out.payload()
                .value()
                .get(keys::EMBEDDINGS_HASH)
                .and_then(|v| v.as_str()),
            Some(hash_canonical(&table).unwrap().as_str())
        );
    }

    #[tokio::test]
    async fn test_already_embedded_chunks_are_skipped() {
        let artifacts = artifacts_with_chunks(&["alpha"]);
        let mut table = artifacts.load_embeddings().unwrap();
        table.merge(&["alpha".into()], &[vec![1.0]]).unwrap();
        artifacts.store_embeddings(&table).unwrap();

        // The client would fail, but nothing needs embedding.
        let stage = EmbeddingStage::new(Arc::new(FailingEmbed), artifacts);
        let store = store_with_sampled_doc();
        let out = stage
            .execute(&context(&store, &[keys::SAMPLED_DOC_URL]))
            .await
            .unwrap();
        assert!(out.payload().value().get(keys::EMBEDDINGS_HASH).is_some());
    }

    #[tokio::test]
    async fn test_provider_failure_yields_error_payload() {
        let artifacts = artifacts_with_chunks(&["alpha"]);
        let stage = EmbeddingStage::new(Arc::new(FailingEmbed), artifacts);
        let store = store_with_sampled_doc();
        let out = stage
            .execute(&context(&store, &[keys::SAMPLED_DOC_URL]))
            .await
            .unwrap();
        assert!(out.payload().value().get("error").is_some());
    }
}
