//! Port definitions
//!
//! Interfaces the pipeline depends on. Implementations (adapters) live in
//! the infrastructure layer.

pub mod artifacts;
pub mod blob;
pub mod checkpoint;
pub mod embed;
pub mod feed;
pub mod scrape;
pub mod search;
pub mod transport;

pub use artifacts::{ArtifactError, ArtifactRepository};
pub use blob::{BlobError, BlobStore};
pub use checkpoint::{CheckpointError, CheckpointRegister};
pub use embed::{EmbedClient, EmbedError};
pub use feed::{FeedError, QueryFeed};
pub use scrape::{ScrapeClient, ScrapeError, TextExtractor};
pub use search::{SearchClient, SearchError, SearchHit};
pub use transport::{RoundTransport, RoundVerdict, TransportError, VerdictOutcome};
