//! Round transport port
//!
//! Carries ballots to whatever collects them and hands back the round
//! verdict. The local in-process bus and any networked implementation live
//! in the infrastructure layer.

use async_trait::async_trait;
use researcher_domain::{CanonicalPayload, RoundId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Ballot rejected: {0}")]
    Rejected(String),
}

/// What a finalized round agreed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictOutcome {
    /// Enough identical ballots arrived.
    Agreed(CanonicalPayload),
    /// No payload can still reach the threshold.
    NoMajority,
}

/// The verdict of one round, stamped once at finalization so every
/// participant observes the same synchronized time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundVerdict {
    pub outcome: VerdictOutcome,
    pub synced_time: i64,
}

#[async_trait]
pub trait RoundTransport: Send + Sync {
    /// Submit this participant's ballot for round `seq`.
    async fn submit(
        &self,
        seq: u64,
        round: RoundId,
        participant: &str,
        payload: CanonicalPayload,
    ) -> Result<(), TransportError>;

    /// Wait for the verdict of round `seq`. Resolves once the round
    /// finalizes; callers bound the wait with their round timeout.
    async fn await_verdict(&self, seq: u64) -> Result<RoundVerdict, TransportError>;

    /// Withdraw this participant's ballot for round `seq`, so a timed-out
    /// round can be retried cleanly under the next sequence number. If the
    /// round finalized while the participant's timer was firing, the
    /// verdict is returned instead so the participant can catch up rather
    /// than fall out of step with the group.
    async fn abandon(
        &self,
        seq: u64,
        participant: &str,
    ) -> Result<Option<RoundVerdict>, TransportError>;
}
