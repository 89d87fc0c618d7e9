//! Application layer for doc-researcher
//!
//! This crate contains the pipeline stages, the round orchestrator, port
//! definitions and execution parameters. It depends only on the domain
//! layer.

pub mod chain;
pub mod config;
pub mod lifecycle;
pub mod orchestrator;
pub mod ports;
pub mod stages;

// Re-export commonly used types
pub use chain::{ChainError, CheckpointChain};
pub use config::ExecutionParams;
pub use orchestrator::{OrchestratorError, RoundOrchestrator, RunReport};
pub use ports::{
    ArtifactError, ArtifactRepository, BlobError, BlobStore, CheckpointError, CheckpointRegister,
    EmbedClient, EmbedError, FeedError, QueryFeed, RoundTransport, RoundVerdict, ScrapeClient,
    ScrapeError, SearchClient, SearchError, SearchHit, TextExtractor, TransportError,
    VerdictOutcome,
};
pub use stages::{
    CheckDocumentsStage, EmbeddingStage, PipelineStage, ProcessHtmlStage, PublishStage,
    SampleQueryStage, SamplingStage, SearchEngineStage, StageContext, StageError, StageOutput,
    UpdateFilesStage, UpdateQueriesStage, WebScrapeStage,
};
