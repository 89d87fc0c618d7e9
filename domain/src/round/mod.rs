//! Round primitive: one threshold-agreement step of the pipeline

pub mod ballot;
pub mod payload;
pub mod spec;

pub use ballot::{BallotBox, RoundOutcome};
pub use payload::{to_canonical_json, CanonicalPayload};
pub use spec::RoundSpec;
