//! In-process round bus
//!
//! Collects ballots from every participant of a local run and finalizes
//! each round once the agreement threshold is decided. The verdict is
//! stamped with one timestamp at finalization, so all participants commit
//! the same synchronized time. Slots are dropped once every participant
//! has moved past them, so long runs do not accumulate finalized rounds.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;

use researcher_application::ports::transport::{
    RoundTransport, RoundVerdict, TransportError, VerdictOutcome,
};
use researcher_domain::{BallotBox, CanonicalPayload, RoundId, RoundOutcome};

struct RoundSlot {
    round: RoundId,
    ballots: BallotBox,
    verdict: Option<RoundVerdict>,
}

#[derive(Default)]
struct BusState {
    rounds: BTreeMap<u64, RoundSlot>,
    /// Highest sequence number each participant has submitted for.
    progress: BTreeMap<String, u64>,
}

pub struct LocalRoundBus {
    num_agents: usize,
    threshold: usize,
    state: Mutex<BusState>,
    version: watch::Sender<u64>,
}

impl LocalRoundBus {
    pub fn new(num_agents: usize, threshold: Option<usize>) -> Self {
        let threshold = threshold.unwrap_or_else(|| BallotBox::default_threshold(num_agents));
        let (version, _) = watch::channel(0);
        Self {
            num_agents,
            threshold,
            state: Mutex::new(BusState::default()),
            version,
        }
    }

    fn verdict_for(&self, seq: u64) -> Result<Option<RoundVerdict>, TransportError> {
        Ok(self
            .state
            .lock()
            .map_err(|_| TransportError::Closed)?
            .rounds
            .get(&seq)
            .and_then(|slot| slot.verdict.clone()))
    }

    /// Drop slots every participant has submitted past. A participant at
    /// sequence `k` never goes back below `k`, so the minimum progress is
    /// a safe retirement watermark.
    fn prune(state: &mut BusState, num_agents: usize) {
        if state.progress.len() < num_agents {
            return;
        }
        if let Some(watermark) = state.progress.values().min().copied() {
            state.rounds.retain(|seq, _| *seq >= watermark);
        }
    }
}

#[async_trait]
impl RoundTransport for LocalRoundBus {
    async fn submit(
        &self,
        seq: u64,
        round: RoundId,
        participant: &str,
        payload: CanonicalPayload,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().map_err(|_| TransportError::Closed)?;
        if !state.rounds.contains_key(&seq) {
            let ballots = BallotBox::new(self.num_agents, self.threshold)
                .map_err(|e| TransportError::Rejected(e.to_string()))?;
            state.rounds.insert(
                seq,
                RoundSlot {
                    round,
                    ballots,
                    verdict: None,
                },
            );
        }
        let slot = state.rounds.get_mut(&seq).ok_or(TransportError::Closed)?;

        // A participant raced ahead or fell behind: its ballot belongs to
        // a different round than the one the slot collects.
        if slot.round != round {
            return Err(TransportError::Rejected(format!(
                "seq {seq} collects {}, got a ballot for {round}",
                slot.round
            )));
        }
        if slot.verdict.is_some() {
            return Err(TransportError::Rejected(format!(
                "round {seq} already finalized"
            )));
        }
        slot.ballots
            .submit(participant, payload)
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        debug!(seq, %round, participant, submitted = slot.ballots.num_submitted(), "ballot collected");

        let outcome = match slot.ballots.try_finalize() {
            RoundOutcome::Pending => None,
            RoundOutcome::Done(agreed) => Some(VerdictOutcome::Agreed(agreed)),
            RoundOutcome::NoMajority => Some(VerdictOutcome::NoMajority),
        };
        let finalized = outcome.is_some();
        if let Some(outcome) = outcome {
            slot.verdict = Some(RoundVerdict {
                outcome,
                synced_time: Utc::now().timestamp(),
            });
        }

        state.progress.insert(participant.to_string(), seq);
        Self::prune(&mut state, self.num_agents);
        drop(state);

        if finalized {
            self.version.send_modify(|v| *v += 1);
        }
        Ok(())
    }

    async fn await_verdict(&self, seq: u64) -> Result<RoundVerdict, TransportError> {
        let mut version = self.version.subscribe();
        loop {
            if let Some(verdict) = self.verdict_for(seq)? {
                return Ok(verdict);
            }
            version
                .changed()
                .await
                .map_err(|_| TransportError::Closed)?;
        }
    }

    async fn abandon(
        &self,
        seq: u64,
        participant: &str,
    ) -> Result<Option<RoundVerdict>, TransportError> {
        let mut state = self.state.lock().map_err(|_| TransportError::Closed)?;
        let Some(slot) = state.rounds.get_mut(&seq) else {
            return Ok(None);
        };
        if let Some(verdict) = slot.verdict.clone() {
            return Ok(Some(verdict));
        }
        slot.ballots.withdraw(participant);
        debug!(seq, participant, "ballot withdrawn");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn payload(value: serde_json::Value) -> CanonicalPayload {
        CanonicalPayload::normalize(&value)
    }

    #[tokio::test]
    async fn test_threshold_of_identical_ballots_finalizes() {
        let bus = Arc::new(LocalRoundBus::new(3, None));
        let agreed = payload(json!({"num_unprocessed": 2}));

        let waiter = {
            let bus = bus.clone();
            tokio::spawn(async move { bus.await_verdict(0).await })
        };

        for participant in ["alpha", "beta", "gamma"] {
            bus.submit(0, RoundId::CheckDocuments, participant, agreed.clone())
                .await
                .unwrap();
        }

        let verdict = waiter.await.unwrap().unwrap();
        assert_eq!(verdict.outcome, VerdictOutcome::Agreed(agreed));
        assert!(verdict.synced_time > 0);
    }

    #[tokio::test]
    async fn test_split_votes_reach_no_majority() {
        let bus = LocalRoundBus::new(3, None);
        for (participant, count) in [("alpha", 1), ("beta", 2), ("gamma", 3)] {
            bus.submit(
                1,
                RoundId::CheckDocuments,
                participant,
                payload(json!({"num_unprocessed": count})),
            )
            .await
            .unwrap();
        }
        let verdict = bus.await_verdict(1).await.unwrap();
        assert_eq!(verdict.outcome, VerdictOutcome::NoMajority);
    }

    #[tokio::test]
    async fn test_duplicate_ballot_is_rejected() {
        let bus = LocalRoundBus::new(3, None);
        let p = payload(json!({"num_unprocessed": 1}));
        bus.submit(2, RoundId::CheckDocuments, "alpha", p.clone())
            .await
            .unwrap();
        assert!(matches!(
            bus.submit(2, RoundId::CheckDocuments, "alpha", p).await,
            Err(TransportError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_mismatched_round_ballot_is_rejected() {
        let bus = LocalRoundBus::new(3, None);
        let p = payload(json!({"num_unprocessed": 1}));
        bus.submit(3, RoundId::CheckDocuments, "alpha", p.clone())
            .await
            .unwrap();
        assert!(matches!(
            bus.submit(3, RoundId::Sampling, "beta", p).await,
            Err(TransportError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_abandon_withdraws_only_own_ballot() {
        let bus = LocalRoundBus::new(3, None);
        let p = payload(json!({"num_unprocessed": 1}));
        bus.submit(4, RoundId::CheckDocuments, "alpha", p.clone())
            .await
            .unwrap();
        bus.submit(4, RoundId::CheckDocuments, "beta", p.clone())
            .await
            .unwrap();
        assert!(bus.abandon(4, "alpha").await.unwrap().is_none());

        // Beta's live ballot survived; alpha resubmits and the round
        // still finalizes.
        bus.submit(4, RoundId::CheckDocuments, "alpha", p.clone())
            .await
            .unwrap();
        bus.submit(4, RoundId::CheckDocuments, "gamma", p).await.unwrap();
        assert!(matches!(
            bus.await_verdict(4).await.unwrap().outcome,
            VerdictOutcome::Agreed(_)
        ));
    }

    #[tokio::test]
    async fn test_abandon_after_finalization_returns_the_verdict() {
        let bus = LocalRoundBus::new(3, None);
        let p = payload(json!({"num_unprocessed": 1}));
        for participant in ["alpha", "beta", "gamma"] {
            bus.submit(5, RoundId::CheckDocuments, participant, p.clone())
                .await
                .unwrap();
        }

        // A timer firing just after finalization must observe the verdict
        // instead of discarding its ballot and falling out of step.
        let verdict = bus.abandon(5, "alpha").await.unwrap().unwrap();
        assert_eq!(verdict.outcome, VerdictOutcome::Agreed(p));
    }

    #[tokio::test]
    async fn test_passed_slots_are_pruned() {
        let bus = LocalRoundBus::new(2, None);
        let p = payload(json!({"num_unprocessed": 1}));
        for seq in 0..5u64 {
            for participant in ["alpha", "beta"] {
                bus.submit(seq, RoundId::CheckDocuments, participant, p.clone())
                    .await
                    .unwrap();
            }
        }
        // Both participants are at seq 4; everything older is gone.
        let state = bus.state.lock().unwrap();
        assert_eq!(state.rounds.keys().copied().collect::<Vec<_>>(), vec![4]);
    }
}
