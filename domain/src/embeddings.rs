//! Embeddings table: text chunks paired with their vectors
//!
//! Stored as a sorted list of rows so that the serialized form, and
//! therefore its content hash, is identical across participants.

use serde::{Deserialize, Serialize};

use crate::core::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRow {
    pub text_chunk: String,
    pub vector: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingsTable {
    rows: Vec<EmbeddingRow>,
}

impl EmbeddingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[EmbeddingRow] {
        &self.rows
    }

    pub fn contains_chunk(&self, chunk: &str) -> bool {
        self.rows.iter().any(|row| row.text_chunk == chunk)
    }

    /// Merge new chunk/vector pairs into the table. Chunks already present
    /// keep their existing vectors; rows stay sorted by chunk text. The two
    /// slices must be aligned pairwise.
    pub fn merge(&mut self, chunks: &[String], vectors: &[Vec<f64>]) -> Result<usize, DomainError> {
        if chunks.len() != vectors.len() {
            return Err(DomainError::ChunkVectorMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }

        let mut added = 0;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            if self.contains_chunk(chunk) {
                continue;
            }
            self.rows.push(EmbeddingRow {
                text_chunk: chunk.clone(),
                vector: vector.clone(),
            });
            added += 1;
        }
        self.rows
            .sort_by(|a, b| a.text_chunk.cmp(&b.text_chunk));
        Ok(added)
    }
}
