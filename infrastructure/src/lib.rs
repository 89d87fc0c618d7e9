//! Infrastructure layer for doc-researcher
//!
//! Adapters for the application layer's ports: HTTP clients for search,
//! scraping, embeddings and the query feed, blob and checkpoint storage,
//! the file-backed artifact repository, the in-process round bus and
//! configuration loading.

pub mod artifacts;
pub mod blob;
pub mod checkpoint;
pub mod clients;
pub mod config;
pub mod html;
pub mod transport;

// Re-export commonly used types
pub use artifacts::FileArtifactRepository;
pub use blob::{HttpBlobStore, MemoryBlobStore};
pub use checkpoint::MemoryCheckpointRegister;
pub use clients::{HttpEmbedClient, HttpQueryFeed, HttpScrapeClient, HttpSearchClient};
pub use config::{ConfigLoader, FileConfig};
pub use html::HtmlTextExtractor;
pub use transport::LocalRoundBus;
