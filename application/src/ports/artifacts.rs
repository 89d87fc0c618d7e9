//! Artifact repository port
//!
//! Local persistence for the working copies of the four artifact files.
//! Missing or corrupt artifacts load as empty collections; the file adapter
//! logs a warning and carries on.

use researcher_domain::{Document, DocumentMapping, EmbeddingsTable, Query};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error on {name}: {message}")]
    Io { name: String, message: String },

    #[error("Artifact {name} could not be encoded: {message}")]
    Encode { name: String, message: String },
}

pub trait ArtifactRepository: Send + Sync {
    fn load_documents(&self) -> Result<Vec<Document>, ArtifactError>;
    fn store_documents(&self, documents: &[Document]) -> Result<(), ArtifactError>;

    fn load_queries(&self) -> Result<Vec<Query>, ArtifactError>;
    fn store_queries(&self, queries: &[Query]) -> Result<(), ArtifactError>;

    fn load_mappings(&self) -> Result<Vec<DocumentMapping>, ArtifactError>;
    fn store_mappings(&self, mappings: &[DocumentMapping]) -> Result<(), ArtifactError>;

    fn load_embeddings(&self) -> Result<EmbeddingsTable, ArtifactError>;
    fn store_embeddings(&self, embeddings: &EmbeddingsTable) -> Result<(), ArtifactError>;
}
