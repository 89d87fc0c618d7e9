//! Execution parameters for the round loop
//!
//! [`ExecutionParams`] groups the static parameters that control the
//! orchestrator and the stages. These are application-layer concerns, not
//! domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Round loop and stage control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Number of participants in the group.
    pub num_agents: usize,
    /// Agreement threshold. `None` derives the default two-thirds majority.
    pub threshold: Option<usize>,
    /// How long to wait for a round verdict before retrying the round.
    pub round_timeout: Duration,
    /// Upper bound on rounds per run, covering retry self-loops.
    pub max_rounds: usize,
    /// Stop after this many published checkpoints.
    pub max_cycles: usize,
    /// How many hits to request per search.
    pub search_results_per_query: usize,
    /// Upper bound on text chunks kept per document.
    pub max_chunks_per_document: usize,
    /// Target size of one text chunk, in characters.
    pub chunk_chars: usize,
    /// How long a document stays blacklisted after a failed scrape.
    pub blacklist_cooldown_secs: i64,
    /// Attempts per external request before giving up.
    pub retry_attempts: usize,
    /// Base backoff between retries; doubles per attempt.
    pub retry_backoff: Duration,
    /// Per-request timeout for outbound HTTP calls.
    pub request_timeout: Duration,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            num_agents: 1,
            threshold: None,
            round_timeout: Duration::from_secs(30),
            max_rounds: 200,
            max_cycles: 1,
            search_results_per_query: 5,
            max_chunks_per_document: 50,
            chunk_chars: 1200,
            blacklist_cooldown_secs: 60 * 60 * 24,
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ExecutionParams {
    pub fn with_num_agents(mut self, num_agents: usize) -> Self {
        self.num_agents = num_agents;
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }
}
