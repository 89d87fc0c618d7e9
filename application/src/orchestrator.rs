//! Round orchestrator
//!
//! Drives one participant through the transition graph: run the stage for
//! the current round, submit the resulting ballot, wait for the verdict,
//! commit agreed data into the synchronized store and follow the event's
//! edge. Timed-out and split rounds retry in place through their
//! self-loops.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use researcher_domain::{
    keys, ContentHash, DomainError, Event, FsmError, RoundId, RoundSpec, SynchronizedStore,
    TransitionTable,
};

use crate::chain::{ChainError, CheckpointChain};
use crate::config::ExecutionParams;
use crate::ports::transport::{RoundTransport, RoundVerdict, TransportError, VerdictOutcome};
use crate::stages::{PipelineStage, StageContext, StageError};

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Fsm(#[from] FsmError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("No stage registered for round {0}")]
    MissingStage(RoundId),
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub rounds_completed: usize,
    pub cycles_completed: usize,
    pub final_round: RoundId,
    pub commits: usize,
}

pub struct RoundOrchestrator {
    participant_id: String,
    table: TransitionTable,
    store: SynchronizedStore,
    transport: Arc<dyn RoundTransport>,
    stages: BTreeMap<RoundId, Arc<dyn PipelineStage>>,
    chain: Option<CheckpointChain>,
    params: ExecutionParams,
    seq: u64,
}

impl RoundOrchestrator {
    pub fn new(
        participant_id: impl Into<String>,
        table: TransitionTable,
        transport: Arc<dyn RoundTransport>,
        stages: Vec<Arc<dyn PipelineStage>>,
        params: ExecutionParams,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            table,
            store: SynchronizedStore::new(),
            transport,
            stages: stages.into_iter().map(|s| (s.round(), s)).collect(),
            chain: None,
            params,
            seq: 0,
        }
    }

    /// Anchor agreed manifest hashes onto this chain after each committed
    /// publish round.
    pub fn with_checkpoint_chain(mut self, chain: CheckpointChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn store(&self) -> &SynchronizedStore {
        &self.store
    }

    /// Run from `start` until a terminal round, the cycle budget, the round
    /// budget or cancellation.
    #[instrument(skip_all, fields(participant = %self.participant_id))]
    pub async fn run(
        &mut self,
        start: RoundId,
        cancel: CancellationToken,
    ) -> Result<RunReport, OrchestratorError> {
        let mut current = start;
        let mut rounds_completed = 0;
        let mut cycles_completed = 0;
        let mut commits = 0;

        while rounds_completed < self.params.max_rounds {
            if cancel.is_cancelled() {
                info!(round = %current, "run cancelled");
                break;
            }
            if self.table.is_terminal(current) {
                info!(round = %current, "terminal round reached");
                break;
            }

            let event = self.run_round(current, &cancel, &mut commits).await?;
            rounds_completed += 1;

            if current == RoundId::Publish && event == Event::Done {
                cycles_completed += 1;
                if cycles_completed >= self.params.max_cycles {
                    info!(cycles = cycles_completed, "cycle budget reached");
                    current = self.table.next(current, event)?;
                    break;
                }
            }

            current = self.table.next(current, event)?;
        }

        Ok(RunReport {
            rounds_completed,
            cycles_completed,
            final_round: current,
            commits,
        })
    }

    async fn run_round(
        &mut self,
        round: RoundId,
        cancel: &CancellationToken,
        commits: &mut usize,
    ) -> Result<Event, OrchestratorError> {
        let spec = RoundSpec::of(round);
        for key in spec.pre_conditions {
            // Fails loudly: a missing pre-condition is a graph bug, not a
            // recoverable round outcome.
            if !self.store.contains(key) {
                return Err(FsmError::PreconditionUnmet {
                    round,
                    key: (*key).to_string(),
                }
                .into());
            }
        }

        let stage = self
            .stages
            .get(&round)
            .ok_or(OrchestratorError::MissingStage(round))?
            .clone();

        // One deadline covers the stage work and the verdict wait, so a
        // hung provider cannot stall the round past its timeout. Dropping
        // the stage future cancels its in-flight requests.
        let deadline = tokio::time::Instant::now() + self.params.round_timeout;

        let ctx = StageContext {
            reader: self.store.reader(spec.pre_conditions),
            synced_time: self.store.synced_time(),
            randomness: round_randomness(self.seq, self.store.get(keys::MANIFEST_HASH)),
        };
        let output = tokio::select! {
            _ = cancel.cancelled() => {
                info!(%round, "cancelled during stage execution");
                return Ok(Event::RoundTimeout);
            }
            output = tokio::time::timeout_at(deadline, stage.execute(&ctx)) => match output {
                Ok(output) => output?,
                Err(_) => {
                    warn!(%round, "stage deadline expired");
                    return Ok(Event::RoundTimeout);
                }
            }
        };
        drop(ctx);

        let seq = self.seq;
        self.seq += 1;
        self.transport
            .submit(seq, round, &self.participant_id, output.into_payload())
            .await?;
        debug!(%round, seq, "ballot submitted");

        let verdict = tokio::select! {
            _ = cancel.cancelled() => {
                match self.transport.abandon(seq, &self.participant_id).await? {
                    Some(verdict) => verdict,
                    None => return Ok(Event::RoundTimeout),
                }
            }
            verdict = tokio::time::timeout_at(deadline, self.transport.await_verdict(seq)) => {
                match verdict {
                    Ok(verdict) => verdict?,
                    // The round may have finalized in the same instant the
                    // timer fired; taking the verdict keeps this
                    // participant in step with the group.
                    Err(_) => match self.transport.abandon(seq, &self.participant_id).await? {
                        Some(verdict) => {
                            debug!(%round, seq, "verdict arrived at the deadline");
                            verdict
                        }
                        None => {
                            warn!(%round, seq, "round timed out");
                            return Ok(Event::RoundTimeout);
                        }
                    },
                }
            }
        };

        self.apply_verdict(round, seq, &stage, verdict, commits).await
    }

    async fn apply_verdict(
        &mut self,
        round: RoundId,
        seq: u64,
        stage: &Arc<dyn PipelineStage>,
        verdict: RoundVerdict,
        commits: &mut usize,
    ) -> Result<Event, OrchestratorError> {
        let spec = RoundSpec::of(round);
        match verdict.outcome {
            VerdictOutcome::NoMajority => {
                warn!(%round, seq, "no majority");
                Ok(Event::NoMajority)
            }
            VerdictOutcome::Agreed(payload) => {
                let value = payload.value();
                let event = spec.event_for(&value);
                if spec.commits(&value) {
                    let kvs: BTreeMap<String, serde_json::Value> = spec
                        .selection_keys
                        .iter()
                        .filter_map(|key| {
                            value.get(*key).map(|v| (key.to_string(), v.clone()))
                        })
                        .collect();
                    self.store.commit(seq, round, kvs, verdict.synced_time);
                    *commits += 1;
                    stage.on_commit(&value).await?;
                    self.anchor_if_published(round, event, &value).await?;
                }
                debug!(%round, seq, %event, "round finalized");
                Ok(event)
            }
        }
    }

    /// Anchoring is gated behind agreement: only a manifest hash the group
    /// finalized a publish round on reaches the register.
    async fn anchor_if_published(
        &self,
        round: RoundId,
        event: Event,
        value: &serde_json::Value,
    ) -> Result<(), OrchestratorError> {
        if round != RoundId::Publish || event != Event::Done {
            return Ok(());
        }
        let Some(chain) = &self.chain else {
            return Ok(());
        };
        let hash = value
            .get(keys::MANIFEST_HASH)
            .and_then(|v| v.as_str())
            .ok_or_else(|| DomainError::MissingKey(keys::MANIFEST_HASH.to_string()))?;
        let hash = ContentHash::parse(hash)?;
        chain.anchor(&hash).await?;
        Ok(())
    }
}

/// Shared per-round randomness: every participant derives the same seed
/// from the round sequence number and the last checkpointed manifest.
fn round_randomness(seq: u64, manifest: Option<&serde_json::Value>) -> String {
    let anchor = manifest.and_then(|v| v.as_str()).unwrap_or("genesis");
    ContentHash::of_bytes(format!("{anchor}:{seq}").as_bytes())
        .as_str()
        .to_string()
}
