//! Pipeline stages
//!
//! One stage per interior round. A stage reads its declared pre-condition
//! keys from the synchronized store, does the participant-local work, and
//! proposes the payload the group will vote on. Expected external failures
//! become the round's none or error payload; only local faults surface as
//! [`StageError`].

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use researcher_domain::{CanonicalPayload, DomainError, RoundId, StoreReader};

use crate::chain::ChainError;
use crate::ports::artifacts::ArtifactError;

mod check_documents;
mod embedding;
mod process_html;
mod publish;
mod sample_query;
mod sampling;
mod search_engine;
mod update_files;
mod update_queries;
mod web_scrape;

pub use check_documents::CheckDocumentsStage;
pub use embedding::EmbeddingStage;
pub use process_html::ProcessHtmlStage;
pub use publish::PublishStage;
pub use sample_query::SampleQueryStage;
pub use sampling::SamplingStage;
pub use search_engine::SearchEngineStage;
pub use update_files::UpdateFilesStage;
pub use update_queries::UpdateQueriesStage;
pub use web_scrape::WebScrapeStage;

#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Read-only view a stage gets of the synchronized state.
pub struct StageContext<'a> {
    /// Store access restricted to the round's declared pre-condition keys.
    pub reader: StoreReader<'a>,
    /// Verdict timestamp of the last committed round.
    pub synced_time: i64,
    /// Shared randomness for this round, identical across participants.
    pub randomness: String,
}

/// The payload a stage proposes for its round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    payload: CanonicalPayload,
}

impl StageOutput {
    /// A data payload. Must be a JSON object holding the round's selection
    /// keys.
    pub fn object(value: Value) -> Self {
        Self {
            payload: CanonicalPayload::normalize(&value),
        }
    }

    /// The none payload, mapped to the round's none event.
    pub fn none() -> Self {
        Self {
            payload: CanonicalPayload::normalize(&Value::Null),
        }
    }

    /// An error payload, mapped to the round's error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::object(serde_json::json!({ "error": message.into() }))
    }

    pub fn payload(&self) -> &CanonicalPayload {
        &self.payload
    }

    pub fn into_payload(self) -> CanonicalPayload {
        self.payload
    }
}

#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// The round this stage serves.
    fn round(&self) -> RoundId;

    /// Produce this participant's payload for the round. A retried round
    /// re-runs this against the last committed state, so any local write
    /// here must re-derive the same proposal on a retry.
    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError>;

    /// Apply the agreed payload to local state. Called exactly once per
    /// committed round, after the agreed keys land in the synchronized
    /// store.
    async fn on_commit(&self, agreed: &Value) -> Result<(), StageError> {
        let _ = agreed;
        Ok(())
    }
}
