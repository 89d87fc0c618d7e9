//! Blob store adapters

pub mod http;
pub mod memory;

pub use http::HttpBlobStore;
pub use memory::MemoryBlobStore;
