//! Manifest of published artifacts, itself content-addressed
//!
//! Each cycle publishes its artifact set as a manifest mapping stable
//! artifact names to content hashes. The manifest's own hash is the value
//! the participants agree on and checkpoint, anchoring the full artifact
//! set under a single digest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::hash::{hash_canonical, ContentHash};
use crate::core::DomainError;

/// The artifacts a cycle can publish. Names are part of the manifest's
/// wire format and must stay stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactKind {
    Documents,
    Embeddings,
    UrlsToDoc,
    Queries,
}

impl ArtifactKind {
    pub fn manifest_name(&self) -> &'static str {
        match self {
            ArtifactKind::Documents => "documents_json",
            ArtifactKind::Embeddings => "embeddings_json",
            ArtifactKind::UrlsToDoc => "urls_to_doc_json",
            ArtifactKind::Queries => "queries_json",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Documents => "documents.json",
            ArtifactKind::Embeddings => "embeddings.json",
            ArtifactKind::UrlsToDoc => "urls_to_doc.json",
            ArtifactKind::Queries => "queries.json",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ContentHash>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ArtifactKind, hash: ContentHash) {
        self.entries.insert(kind.manifest_name().to_string(), hash);
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&ContentHash> {
        self.entries.get(kind.manifest_name())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContentHash)> {
        self.entries.iter()
    }

    /// Digest of the manifest itself. Entries are kept sorted by name, so
    /// equal artifact sets always hash identically.
    pub fn hash(&self) -> Result<ContentHash, DomainError> {
        hash_canonical(self)
    }
}
