//! Content-addressed checkpointing of published artifact sets

pub mod hash;
pub mod manifest;

pub use hash::{hash_canonical, ContentHash};
pub use manifest::{ArtifactKind, Manifest};
