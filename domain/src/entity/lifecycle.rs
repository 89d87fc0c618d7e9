//! Freeze predicate shared by every entity variant
//!
//! The original freeze rule was applied inconsistently across the document,
//! query and mapping variants. Here a single trait provides the one rule used
//! everywhere: an entity is frozen iff it is processed, or it is blacklisted
//! and the blacklist has not yet expired.

use super::status::ProcessingStatus;

/// Sentinel for "not blacklisted".
pub const NOT_BLACKLISTED: i64 = -1;

/// Common lifecycle surface of documents, queries and mappings.
pub trait Lifecycle {
    /// Identity key of the entity (its url).
    fn key(&self) -> &str;

    fn status(&self) -> ProcessingStatus;

    fn set_status(&mut self, status: ProcessingStatus);

    /// Blacklist expiration as epoch seconds, [`NOT_BLACKLISTED`] when unset.
    fn blacklist_expiration(&self) -> i64;

    /// Whether the entity is excluded from further work.
    ///
    /// `now` must be the consensus-synchronized timestamp, never an agent's
    /// wall clock, or agents would disagree on freeze state and fail to
    /// reach quorum.
    fn is_frozen(&self, now: i64) -> bool {
        match self.status() {
            ProcessingStatus::Processed => true,
            ProcessingStatus::Blacklisted => self.blacklist_expiration() > now,
            ProcessingStatus::Unprocessed => false,
        }
    }
}
