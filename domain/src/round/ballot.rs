//! Threshold-agreement ballot box
//!
//! One step of the pipeline collects one payload per agent and finalizes as
//! soon as a quorum of bit-identical normalized payloads exists. Disagreement
//! is detected as early as possible: once the outstanding ballots can no
//! longer tip any value over the threshold, the round is a `NoMajority`.

use std::collections::BTreeMap;

use crate::core::error::DomainError;

use super::payload::CanonicalPayload;

/// Outcome of polling a ballot box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Quorum reached on this value
    Done(CanonicalPayload),
    /// Everyone (or enough) voted, no value reached quorum
    NoMajority,
    /// Still collecting ballots
    Pending,
}

impl RoundOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, RoundOutcome::Pending)
    }
}

/// Ballot collection for a single round attempt.
#[derive(Debug, Clone)]
pub struct BallotBox {
    num_agents: usize,
    threshold: usize,
    ballots: BTreeMap<String, CanonicalPayload>,
}

impl BallotBox {
    /// Create a ballot box for `num_agents` agents with the given threshold.
    pub fn new(num_agents: usize, threshold: usize) -> Result<Self, DomainError> {
        if threshold == 0 || threshold > num_agents {
            return Err(DomainError::InvalidThreshold {
                threshold,
                agents: num_agents,
            });
        }
        Ok(Self {
            num_agents,
            threshold,
            ballots: BTreeMap::new(),
        })
    }

    /// Default quorum: `⌊2n/3⌋ + 1`.
    pub fn default_threshold(num_agents: usize) -> usize {
        num_agents * 2 / 3 + 1
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn num_submitted(&self) -> usize {
        self.ballots.len()
    }

    /// Record one payload for one agent. A second submission by the same
    /// agent within the same attempt is rejected.
    pub fn submit(
        &mut self,
        agent_id: &str,
        payload: CanonicalPayload,
    ) -> Result<(), DomainError> {
        if self.ballots.contains_key(agent_id) {
            return Err(DomainError::DuplicateBallot(agent_id.to_string()));
        }
        if self.ballots.len() >= self.num_agents {
            return Err(DomainError::BallotBoxFull {
                agents: self.num_agents,
            });
        }
        self.ballots.insert(agent_id.to_string(), payload);
        Ok(())
    }

    /// Poll for a verdict.
    pub fn try_finalize(&self) -> RoundOutcome {
        let mut counts: BTreeMap<&CanonicalPayload, usize> = BTreeMap::new();
        for payload in self.ballots.values() {
            *counts.entry(payload).or_insert(0) += 1;
        }

        let best = counts.iter().max_by_key(|(_, count)| **count);
        if let Some((payload, count)) = best {
            if *count >= self.threshold {
                return RoundOutcome::Done((*payload).clone());
            }
        }

        let remaining = self.num_agents - self.ballots.len();
        let max_count = best.map(|(_, count)| *count).unwrap_or(0);
        if max_count + remaining < self.threshold {
            return RoundOutcome::NoMajority;
        }

        RoundOutcome::Pending
    }

    /// Remove one agent's ballot, so a participant abandoning the round
    /// does not disturb the others' live ballots.
    pub fn withdraw(&mut self, agent_id: &str) -> bool {
        self.ballots.remove(agent_id).is_some()
    }
}
