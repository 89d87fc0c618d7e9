//! Entity layer: documents, queries and document mappings
//!
//! All three variants share [`ProcessingStatus`] and the [`Lifecycle`]
//! freeze predicate, and are keyed by url.

pub mod document;
pub mod lifecycle;
pub mod mapping;
pub mod query;
pub mod status;

pub use document::{parse_date, Document};
pub use lifecycle::{Lifecycle, NOT_BLACKLISTED};
pub use mapping::DocumentMapping;
pub use query::Query;
pub use status::ProcessingStatus;
