//! Events labeling the edges of the round transition graph

use serde::{Deserialize, Serialize};

/// Events emitted by rounds.
///
/// `NoMajority` and `RoundTimeout` are structural (retry-in-place);
/// `None`, `ToUpdate`, `NoUpdates` and `NoTextChunks` are expected policy
/// branches, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Done,
    None,
    ToUpdate,
    NoUpdates,
    UpdateFailed,
    NoMajority,
    RoundTimeout,
    FetchError,
    NoTextChunks,
}

impl Event {
    /// Structural agreement failures loop the same round with cleared ballots.
    pub fn is_retry(self) -> bool {
        matches!(self, Event::NoMajority | Event::RoundTimeout)
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Event::Done => "done",
            Event::None => "none",
            Event::ToUpdate => "to_update",
            Event::NoUpdates => "no_updates",
            Event::UpdateFailed => "update_failed",
            Event::NoMajority => "no_majority",
            Event::RoundTimeout => "round_timeout",
            Event::FetchError => "fetch_error",
            Event::NoTextChunks => "no_text_chunks",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_events() {
        assert!(Event::NoMajority.is_retry());
        assert!(Event::RoundTimeout.is_retry());
        assert!(!Event::Done.is_retry());
        assert!(!Event::None.is_retry());
    }

    #[test]
    fn test_display_is_snake_case() {
        assert_eq!(Event::NoTextChunks.to_string(), "no_text_chunks");
    }
}
