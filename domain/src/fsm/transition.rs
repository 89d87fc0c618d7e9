//! Transition tables for the pipeline state machines
//!
//! A directed graph of named rounds with event-labeled edges. Every interior
//! round must carry self-loops on `NoMajority` and `RoundTimeout`
//! (retry-in-place); construction validates this along with edge
//! consistency. Two graphs are defined, the documents manager and the
//! scraper, plus a composition that chains them into the full research
//! pipeline.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::event::Event;
use super::round_id::RoundId;

/// Errors in transition-table construction or traversal
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FsmError {
    #[error("Round {round} has no transition for event {event}")]
    NoTransition { round: RoundId, event: Event },

    #[error("Interior round {round} is missing a self-loop on {event}")]
    MissingSelfLoop { round: RoundId, event: Event },

    #[error("Edge {from} --{event}--> {to} targets an undeclared round")]
    UndeclaredTarget {
        from: RoundId,
        event: Event,
        to: RoundId,
    },

    #[error("Terminal round {0} must not have outgoing edges")]
    TerminalWithEdges(RoundId),

    #[error("Pre-conditions unmet for round {round}: missing key '{key}'")]
    PreconditionUnmet { round: RoundId, key: String },

    #[error("Composition maps {0}, which is not a terminal round of the first graph")]
    ComposeNonTerminal(RoundId),
}

/// Event-labeled transition graph over rounds.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    edges: BTreeMap<(RoundId, Event), RoundId>,
    initial: BTreeSet<RoundId>,
    terminal: BTreeSet<RoundId>,
}

impl TransitionTable {
    /// Build and validate a table from explicit edges.
    pub fn new(
        initial: impl IntoIterator<Item = RoundId>,
        terminal: impl IntoIterator<Item = RoundId>,
        edges: impl IntoIterator<Item = (RoundId, Event, RoundId)>,
    ) -> Result<Self, FsmError> {
        let table = Self {
            edges: edges
                .into_iter()
                .map(|(from, event, to)| ((from, event), to))
                .collect(),
            initial: initial.into_iter().collect(),
            terminal: terminal.into_iter().collect(),
        };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), FsmError> {
        let sources: BTreeSet<RoundId> = self.edges.keys().map(|(from, _)| *from).collect();

        for ((from, event), to) in &self.edges {
            if self.terminal.contains(from) {
                return Err(FsmError::TerminalWithEdges(*from));
            }
            if !sources.contains(to) && !self.terminal.contains(to) {
                return Err(FsmError::UndeclaredTarget {
                    from: *from,
                    event: *event,
                    to: *to,
                });
            }
        }

        // Retry-in-place is mandatory for every interior round.
        for from in &sources {
            for event in [Event::NoMajority, Event::RoundTimeout] {
                match self.edges.get(&(*from, event)) {
                    Some(to) if to == from => {}
                    _ => {
                        return Err(FsmError::MissingSelfLoop {
                            round: *from,
                            event,
                        })
                    }
                }
            }
        }

        Ok(())
    }

    pub fn initial_rounds(&self) -> impl Iterator<Item = RoundId> + '_ {
        self.initial.iter().copied()
    }

    pub fn is_terminal(&self, round: RoundId) -> bool {
        self.terminal.contains(&round)
    }

    /// Follow the edge labeled `event` out of `round`.
    pub fn next(&self, round: RoundId, event: Event) -> Result<RoundId, FsmError> {
        self.edges
            .get(&(round, event))
            .copied()
            .ok_or(FsmError::NoTransition { round, event })
    }

    /// Chain this graph with another by mapping terminal rounds of the
    /// combined graph onto continuation rounds.
    ///
    /// Edges that pointed at a mapped terminal are redirected; the mapped
    /// terminals disappear from the result.
    pub fn compose(
        self,
        other: TransitionTable,
        mapping: &[(RoundId, RoundId)],
    ) -> Result<TransitionTable, FsmError> {
        let mut terminal: BTreeSet<RoundId> = self
            .terminal
            .iter()
            .chain(other.terminal.iter())
            .copied()
            .collect();
        for (from, _) in mapping {
            if !terminal.remove(from) {
                return Err(FsmError::ComposeNonTerminal(*from));
            }
        }

        let redirect = |to: RoundId| {
            mapping
                .iter()
                .find(|(from, _)| *from == to)
                .map(|(_, target)| *target)
                .unwrap_or(to)
        };

        let edges: BTreeMap<(RoundId, Event), RoundId> = self
            .edges
            .into_iter()
            .chain(other.edges)
            .map(|((from, event), to)| ((from, event), redirect(to)))
            .collect();

        let table = TransitionTable {
            edges,
            initial: self.initial,
            terminal,
        };
        table.validate()?;
        Ok(table)
    }
}

fn with_self_loops(
    edges: Vec<(RoundId, Event, RoundId)>,
) -> Vec<(RoundId, Event, RoundId)> {
    let sources: BTreeSet<RoundId> = edges.iter().map(|(from, _, _)| *from).collect();
    let mut all = edges;
    for round in sources {
        all.push((round, Event::NoMajority, round));
        all.push((round, Event::RoundTimeout, round));
    }
    all
}

/// The documents-manager graph: keep queries and document collections fresh
/// and decide whether there is anything to scrape.
pub fn documents_manager_table() -> TransitionTable {
    use Event::*;
    use RoundId::*;

    let edges = with_self_loops(vec![
        (UpdateQueries, Done, UpdateFiles),
        (UpdateQueries, FetchError, FailedDocumentsManager),
        (UpdateFiles, Done, CheckDocuments),
        (UpdateFiles, UpdateFailed, FailedDocumentsManager),
        // Zero unprocessed mappings: sample a query and search for new
        // documents. Otherwise there is work to scrape: finish this cycle.
        (CheckDocuments, ToUpdate, SampleQuery),
        (CheckDocuments, NoUpdates, FinishedDocumentsManager),
        (SampleQuery, Done, SearchEngine),
        (SampleQuery, None, FinishedDocumentsManager),
        (SearchEngine, Done, CheckDocuments),
        (SearchEngine, UpdateFailed, FailedDocumentsManager),
    ]);

    TransitionTable::new(
        [RoundId::UpdateQueries, RoundId::CheckDocuments],
        [
            RoundId::FinishedDocumentsManager,
            RoundId::FailedDocumentsManager,
        ],
        edges,
    )
    .expect("documents manager graph is statically valid")
}

/// The scraper graph: work one sampled document through
/// scrape → extract → embed → publish.
pub fn scraper_table() -> TransitionTable {
    use Event::*;
    use RoundId::*;

    let edges = with_self_loops(vec![
        (Sampling, Done, WebScrape),
        (Sampling, None, FinishedWithoutScraping),
        (WebScrape, Done, ProcessHtml),
        (WebScrape, FetchError, FinishedWithoutScraping),
        (ProcessHtml, Done, Embedding),
        (ProcessHtml, NoTextChunks, FinishedWithoutEmbedding),
        (Embedding, Done, Publish),
        (Embedding, FetchError, FinishedWithoutEmbedding),
        (Publish, Done, FinishedScraper),
        (Publish, FetchError, FinishedWithoutEmbedding),
    ]);

    TransitionTable::new(
        [RoundId::Sampling],
        [
            RoundId::FinishedScraper,
            RoundId::FinishedWithoutScraping,
            RoundId::FinishedWithoutEmbedding,
        ],
        edges,
    )
    .expect("scraper graph is statically valid")
}

/// The full research pipeline: documents manager chained with the scraper,
/// cycling back to `CheckDocuments` after every scraper outcome.
pub fn researcher_table() -> TransitionTable {
    documents_manager_table()
        .compose(
            scraper_table(),
            &[
                (RoundId::FinishedDocumentsManager, RoundId::Sampling),
                (RoundId::FinishedScraper, RoundId::CheckDocuments),
                (RoundId::FinishedWithoutScraping, RoundId::CheckDocuments),
                (RoundId::FinishedWithoutEmbedding, RoundId::CheckDocuments),
                (RoundId::FailedDocumentsManager, RoundId::CheckDocuments),
            ],
        )
        .expect("composed researcher graph is statically valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_manager_paths() {
        let table = documents_manager_table();
        assert_eq!(
            table.next(RoundId::UpdateQueries, Event::Done).unwrap(),
            RoundId::UpdateFiles
        );
        assert_eq!(
            table.next(RoundId::CheckDocuments, Event::NoUpdates).unwrap(),
            RoundId::FinishedDocumentsManager
        );
        assert_eq!(
            table.next(RoundId::CheckDocuments, Event::ToUpdate).unwrap(),
            RoundId::SampleQuery
        );
        assert!(table.is_terminal(RoundId::FailedDocumentsManager));
    }

    #[test]
    fn test_retry_self_loops_present() {
        let table = scraper_table();
        for round in [
            RoundId::Sampling,
            RoundId::WebScrape,
            RoundId::ProcessHtml,
            RoundId::Embedding,
            RoundId::Publish,
        ] {
            assert_eq!(table.next(round, Event::NoMajority).unwrap(), round);
            assert_eq!(table.next(round, Event::RoundTimeout).unwrap(), round);
        }
    }

    #[test]
    fn test_missing_self_loop_is_rejected() {
        let result = TransitionTable::new(
            [RoundId::WebScrape],
            [RoundId::FinishedScraper],
            vec![(RoundId::WebScrape, Event::Done, RoundId::FinishedScraper)],
        );
        assert!(matches!(result, Err(FsmError::MissingSelfLoop { .. })));
    }

    #[test]
    fn test_undeclared_target_is_rejected() {
        let result = TransitionTable::new(
            [RoundId::WebScrape],
            [RoundId::FinishedScraper],
            with_self_loops(vec![
                (RoundId::WebScrape, Event::Done, RoundId::Embedding),
            ]),
        );
        assert!(matches!(result, Err(FsmError::UndeclaredTarget { .. })));
    }

    #[test]
    fn test_no_transition_error() {
        let table = scraper_table();
        let err = table.next(RoundId::Sampling, Event::ToUpdate).unwrap_err();
        assert!(matches!(err, FsmError::NoTransition { .. }));
    }

    #[test]
    fn test_composed_graph_chains_and_cycles() {
        let table = researcher_table();
        // Finished documents manager hands over to the scraper.
        assert_eq!(
            table.next(RoundId::CheckDocuments, Event::NoUpdates).unwrap(),
            RoundId::Sampling
        );
        // Every scraper outcome cycles back to CheckDocuments.
        assert_eq!(
            table.next(RoundId::Publish, Event::Done).unwrap(),
            RoundId::CheckDocuments
        );
        assert_eq!(
            table.next(RoundId::Sampling, Event::None).unwrap(),
            RoundId::CheckDocuments
        );
        // The composed pipeline has no terminal rounds left.
        assert!(!table.is_terminal(RoundId::FinishedScraper));
    }

    #[test]
    fn test_compose_rejects_non_terminal_mapping() {
        let result = documents_manager_table().compose(
            scraper_table(),
            &[(RoundId::CheckDocuments, RoundId::Sampling)],
        );
        assert!(matches!(result, Err(FsmError::ComposeNonTerminal(_))));
    }
}
