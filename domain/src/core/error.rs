//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Agent {0} already submitted a ballot for this round")]
    DuplicateBallot(String),

    #[error("Invalid threshold {threshold} for {agents} agents")]
    InvalidThreshold { threshold: usize, agents: usize },

    #[error("Ballot box already holds ballots from all {agents} agents")]
    BallotBoxFull { agents: usize },

    #[error("Synchronized store has no value for key '{0}'")]
    MissingKey(String),

    #[error("Key '{0}' is not declared readable by the current round")]
    UndeclaredKey(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Embedding count does not match text chunks: {vectors} vectors for {chunks} chunks")]
    ChunkVectorMismatch { chunks: usize, vectors: usize },

    #[error("Invalid content hash: {0}")]
    InvalidHash(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Serialization(e.to_string())
    }
}
