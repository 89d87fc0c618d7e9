//! Process HTML stage
//!
//! Turns the scraped markup into text chunks on the sampled document. The
//! agreed chunk count decides whether the cycle continues into embedding
//! or finishes without one.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use researcher_domain::{hash_canonical, keys, RoundId};

use super::{PipelineStage, StageContext, StageError, StageOutput};
use crate::config::ExecutionParams;
use crate::ports::artifacts::ArtifactRepository;
use crate::ports::scrape::TextExtractor;

pub struct ProcessHtmlStage {
    extractor: Arc<dyn TextExtractor>,
    artifacts: Arc<dyn ArtifactRepository>,
    params: ExecutionParams,
}

impl ProcessHtmlStage {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        artifacts: Arc<dyn ArtifactRepository>,
        params: ExecutionParams,
    ) -> Self {
        Self {
            extractor,
            artifacts,
            params,
        }
    }
}

/// Pack text blocks into chunks of roughly `chunk_chars` characters,
/// keeping block boundaries intact. Bounded by `max_chunks`.
fn chunk_blocks(blocks: &[String], chunk_chars: usize, max_chunks: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for block in blocks {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        if !current.is_empty() && current.len() + block.len() + 1 > chunk_chars {
            chunks.push(std::mem::take(&mut current));
            if chunks.len() == max_chunks {
                return chunks;
            }
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(block);
    }
    if !current.is_empty() && chunks.len() < max_chunks {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl PipelineStage for ProcessHtmlStage {
    fn round(&self) -> RoundId {
        RoundId::ProcessHtml
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError> {
        let html = ctx
            .reader
            .get_str(keys::WEB_SCRAPE_DATA)?
            .unwrap_or_default()
            .to_string();
        let url = ctx
            .reader
            .get_str(keys::SAMPLED_DOC_URL)?
            .unwrap_or_default()
            .to_string();

        let blocks = self.extractor.extract(&html);
        let chunks = chunk_blocks(
            &blocks,
            self.params.chunk_chars,
            self.params.max_chunks_per_document,
        );
        debug!(%url, blocks = blocks.len(), chunks = chunks.len(), "page text extracted");

        let mut documents = self.artifacts.load_documents()?;
        for document in &mut documents {
            if document.url == url {
                document.content = Some(blocks.join("\n"));
                document.text_chunks = Some(chunks.clone());
            }
        }
        self.artifacts.store_documents(&documents)?;
        info!(%url, chunks = chunks.len(), "document chunked");

        let hash = hash_canonical(&documents)?;
        Ok(StageOutput::object(json!({
            keys::NUM_TEXT_CHUNKS: chunks.len(),
            keys::DOCUMENTS_HASH: hash.as_str(),
        })))
    }
}
