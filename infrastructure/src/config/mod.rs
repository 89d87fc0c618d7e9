//! Configuration loading

pub mod file_config;
pub mod loader;

pub use file_config::{
    BlobConfig, EmbeddingsConfig, FeedConfig, FileConfig, ParticipantConfig, SearchConfig,
};
pub use loader::ConfigLoader;
