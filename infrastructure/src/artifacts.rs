//! File-backed artifact repository
//!
//! Keeps the four artifact files under one data directory. Missing or
//! corrupt files load as empty collections with a warning, so a fresh or
//! damaged participant can always start and resync from the checkpoint
//! chain. Writes go through a temp file and rename.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use researcher_application::ports::artifacts::{ArtifactError, ArtifactRepository};
use researcher_domain::{
    to_canonical_json, ArtifactKind, Document, DocumentMapping, EmbeddingsTable, Query,
};

pub struct FileArtifactRepository {
    dir: PathBuf,
}

impl FileArtifactRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn load<T: DeserializeOwned + Default>(&self, kind: ArtifactKind) -> T {
        let path = self.path(kind);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "artifact unreadable, starting empty");
                return T::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "artifact undecodable, starting empty");
                T::default()
            }
        }
    }

    fn store<T: Serialize>(&self, kind: ArtifactKind, value: &T) -> Result<(), ArtifactError> {
        let path = self.path(kind);
        let json = to_canonical_json(value).map_err(|e| ArtifactError::Encode {
            name: kind.file_name().to_string(),
            message: e.to_string(),
        })?;
        write_atomic(&path, json.as_bytes()).map_err(|e| ArtifactError::Io {
            name: kind.file_name().to_string(),
            message: e.to_string(),
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

impl ArtifactRepository for FileArtifactRepository {
    fn load_documents(&self) -> Result<Vec<Document>, ArtifactError> {
        Ok(self.load(ArtifactKind::Documents))
    }

    fn store_documents(&self, documents: &[Document]) -> Result<(), ArtifactError> {
        self.store(ArtifactKind::Documents, &documents)
    }

    fn load_queries(&self) -> Result<Vec<Query>, ArtifactError> {
        Ok(self.load(ArtifactKind::Queries))
    }

    fn store_queries(&self, queries: &[Query]) -> Result<(), ArtifactError> {
        self.store(ArtifactKind::Queries, &queries)
    }

    fn load_mappings(&self) -> Result<Vec<DocumentMapping>, ArtifactError> {
        Ok(self.load(ArtifactKind::UrlsToDoc))
    }

    fn store_mappings(&self, mappings: &[DocumentMapping]) -> Result<(), ArtifactError> {
        self.store(ArtifactKind::UrlsToDoc, &mappings)
    }

    fn load_embeddings(&self) -> Result<EmbeddingsTable, ArtifactError> {
        Ok(self.load(ArtifactKind::Embeddings))
    }

    fn store_embeddings(&self, embeddings: &EmbeddingsTable) -> Result<(), ArtifactError> {
        self.store(ArtifactKind::Embeddings, embeddings)
    }
}
