//! Domain layer for doc-researcher
//!
//! This crate contains the core business logic, entities, and value objects
//! of the replicated document-research pipeline. It has no dependencies on
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Rounds
//!
//! Participants advance through a shared state machine one round at a time.
//! In each round every participant submits a canonical payload; once enough
//! identical payloads arrive the round finalizes and every participant
//! applies the same update to its synchronized store.
//!
//! ## Checkpoints
//!
//! Each research cycle publishes its artifact set (documents, embeddings,
//! mappings, queries) under a content-addressed manifest. The manifest hash
//! is what the participants agree on and checkpoint, so any participant can
//! resume from the chain alone.

pub mod checkpoint;
pub mod core;
pub mod embeddings;
pub mod entity;
pub mod fsm;
pub mod round;
pub mod store;

// Re-export commonly used types
pub use checkpoint::{hash_canonical, ArtifactKind, ContentHash, Manifest};
pub use core::DomainError;
pub use embeddings::{EmbeddingRow, EmbeddingsTable};
pub use entity::{
    parse_date, Document, DocumentMapping, Lifecycle, ProcessingStatus, Query, NOT_BLACKLISTED,
};
pub use fsm::{
    documents_manager_table, researcher_table, scraper_table, Event, FsmError, RoundId,
    TransitionTable,
};
pub use round::{to_canonical_json, BallotBox, CanonicalPayload, RoundOutcome, RoundSpec};
pub use store::{keys, CommitRecord, StoreReader, SynchronizedStore};
