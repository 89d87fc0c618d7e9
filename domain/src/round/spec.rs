//! Per-round declarations: keys, events and branch policy
//!
//! Every round declares the store keys it may read (pre-conditions), the
//! keys it produces on agreement (selection keys), and how an agreed value
//! maps to a transition event. This is the schema-by-convention of the
//! synchronized store.

use serde_json::Value;

use crate::fsm::event::Event;
use crate::fsm::round_id::RoundId;
use crate::store::keys;

/// Static declaration for one round.
#[derive(Debug, Clone, Copy)]
pub struct RoundSpec {
    pub id: RoundId,
    /// Keys committed into the synchronized store on agreement
    pub selection_keys: &'static [&'static str],
    /// Keys the round's local computation is allowed to read
    pub pre_conditions: &'static [&'static str],
    /// Keys guaranteed present when this (terminal) round is reached
    pub post_conditions: &'static [&'static str],
    /// Event emitted when the agreed payload is the none value
    pub none_event: Option<Event>,
    /// Event emitted when the agreed payload carries an `error` member
    pub error_event: Option<Event>,
}

impl RoundSpec {
    /// Look up the declaration for a round.
    pub fn of(id: RoundId) -> &'static RoundSpec {
        SPECS
            .iter()
            .find(|spec| spec.id == id)
            .expect("every round id has a spec entry")
    }

    /// Map an agreed value to the transition event for this round.
    ///
    /// The none and error policies are shared; `CheckDocuments` and
    /// `ProcessHtml` add a branch on the agreed count.
    pub fn event_for(&self, value: &Value) -> Event {
        if value.is_null() {
            return self.none_event.unwrap_or(Event::Done);
        }
        if let Some(error_event) = self.error_event {
            if value.get("error").map(|e| !e.is_null()).unwrap_or(false) {
                return error_event;
            }
        }
        match self.id {
            RoundId::CheckDocuments => {
                let unprocessed = value
                    .get(keys::NUM_UNPROCESSED)
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                if unprocessed == 0 {
                    // Nothing left to scrape: go discover new material.
                    Event::ToUpdate
                } else {
                    Event::NoUpdates
                }
            }
            RoundId::ProcessHtml => {
                let chunks = value
                    .get(keys::NUM_TEXT_CHUNKS)
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                if chunks == 0 {
                    Event::NoTextChunks
                } else {
                    Event::Done
                }
            }
            _ => Event::Done,
        }
    }

    /// Whether an agreed value carries data to commit.
    pub fn commits(&self, value: &Value) -> bool {
        value.is_object() && value.get("error").map(Value::is_null).unwrap_or(true)
    }
}

static SPECS: &[RoundSpec] = &[
    RoundSpec {
        id: RoundId::UpdateQueries,
        selection_keys: &[keys::QUERIES_HASH],
        pre_conditions: &[],
        post_conditions: &[],
        none_event: Some(Event::FetchError),
        error_event: None,
    },
    RoundSpec {
        id: RoundId::UpdateFiles,
        selection_keys: &[keys::DOCUMENTS_HASH, keys::EMBEDDINGS_HASH],
        pre_conditions: &[keys::QUERIES_HASH],
        post_conditions: &[],
        none_event: Some(Event::UpdateFailed),
        error_event: None,
    },
    RoundSpec {
        id: RoundId::CheckDocuments,
        selection_keys: &[keys::NUM_UNPROCESSED],
        pre_conditions: &[],
        post_conditions: &[],
        none_event: None,
        error_event: None,
    },
    RoundSpec {
        id: RoundId::SampleQuery,
        selection_keys: &[keys::QUERIES_HASH, keys::SAMPLED_QUERY_URL],
        pre_conditions: &[keys::QUERIES_HASH],
        post_conditions: &[],
        none_event: Some(Event::None),
        error_event: None,
    },
    RoundSpec {
        id: RoundId::SearchEngine,
        selection_keys: &[keys::DOCUMENTS_HASH],
        pre_conditions: &[keys::SAMPLED_QUERY_URL],
        post_conditions: &[],
        none_event: Some(Event::UpdateFailed),
        error_event: Some(Event::UpdateFailed),
    },
    RoundSpec {
        id: RoundId::Sampling,
        selection_keys: &[keys::DOCUMENTS_HASH, keys::SAMPLED_DOC_URL],
        pre_conditions: &[keys::NUM_UNPROCESSED],
        post_conditions: &[],
        none_event: Some(Event::None),
        error_event: None,
    },
    RoundSpec {
        id: RoundId::WebScrape,
        selection_keys: &[keys::WEB_SCRAPE_DATA],
        pre_conditions: &[keys::SAMPLED_DOC_URL],
        post_conditions: &[],
        none_event: Some(Event::FetchError),
        error_event: Some(Event::FetchError),
    },
    RoundSpec {
        id: RoundId::ProcessHtml,
        selection_keys: &[keys::NUM_TEXT_CHUNKS, keys::DOCUMENTS_HASH],
        pre_conditions: &[keys::WEB_SCRAPE_DATA, keys::SAMPLED_DOC_URL],
        post_conditions: &[],
        none_event: Some(Event::NoTextChunks),
        error_event: None,
    },
    RoundSpec {
        id: RoundId::Embedding,
        selection_keys: &[keys::EMBEDDINGS_HASH],
        pre_conditions: &[keys::SAMPLED_DOC_URL],
        post_conditions: &[],
        none_event: Some(Event::FetchError),
        error_event: Some(Event::FetchError),
    },
    RoundSpec {
        id: RoundId::Publish,
        selection_keys: &[keys::MANIFEST_HASH],
        pre_conditions: &[keys::DOCUMENTS_HASH, keys::EMBEDDINGS_HASH],
        post_conditions: &[],
        none_event: Some(Event::FetchError),
        error_event: Some(Event::FetchError),
    },
    RoundSpec {
        id: RoundId::FinishedDocumentsManager,
        selection_keys: &[],
        pre_conditions: &[],
        post_conditions: &[keys::NUM_UNPROCESSED],
        none_event: None,
        error_event: None,
    },
    RoundSpec {
        id: RoundId::FailedDocumentsManager,
        selection_keys: &[],
        pre_conditions: &[],
        post_conditions: &[],
        none_event: None,
        error_event: None,
    },
    RoundSpec {
        id: RoundId::FinishedScraper,
        selection_keys: &[],
        pre_conditions: &[],
        post_conditions: &[keys::MANIFEST_HASH],
        none_event: None,
        error_event: None,
    },
    RoundSpec {
        id: RoundId::FinishedWithoutScraping,
        selection_keys: &[],
        pre_conditions: &[],
        post_conditions: &[],
        none_event: None,
        error_event: None,
    },
    RoundSpec {
        id: RoundId::FinishedWithoutEmbedding,
        selection_keys: &[],
        pre_conditions: &[],
        post_conditions: &[],
        none_event: None,
        error_event: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_round_has_a_spec() {
        for id in [
            RoundId::UpdateQueries,
            RoundId::UpdateFiles,
            RoundId::CheckDocuments,
            RoundId::SampleQuery,
            RoundId::SearchEngine,
            RoundId::Sampling,
            RoundId::WebScrape,
            RoundId::ProcessHtml,
            RoundId::Embedding,
            RoundId::Publish,
        ] {
            assert_eq!(RoundSpec::of(id).id, id);
        }
    }

    #[test]
    fn test_check_documents_branches_on_unprocessed_count() {
        let spec = RoundSpec::of(RoundId::CheckDocuments);
        assert_eq!(spec.event_for(&json!({"num_unprocessed": 0})), Event::ToUpdate);
        assert_eq!(spec.event_for(&json!({"num_unprocessed": 3})), Event::NoUpdates);
    }

    #[test]
    fn test_process_html_branches_on_chunk_count() {
        let spec = RoundSpec::of(RoundId::ProcessHtml);
        assert_eq!(
            spec.event_for(&json!({"num_text_chunks": 0, "documents_hash": "h"})),
            Event::NoTextChunks
        );
        assert_eq!(
            spec.event_for(&json!({"num_text_chunks": 7, "documents_hash": "h"})),
            Event::Done
        );
    }

    #[test]
    fn test_none_payload_emits_none_event() {
        let spec = RoundSpec::of(RoundId::SampleQuery);
        assert_eq!(spec.event_for(&Value::Null), Event::None);
    }

    #[test]
    fn test_error_payload_emits_error_event_and_skips_commit() {
        let spec = RoundSpec::of(RoundId::WebScrape);
        let value = json!({"error": "retries exceeded"});
        assert_eq!(spec.event_for(&value), Event::FetchError);
        assert!(!spec.commits(&value));
    }

    #[test]
    fn test_object_payload_commits() {
        let spec = RoundSpec::of(RoundId::WebScrape);
        let value = json!({"web_scrape_data": "<html></html>"});
        assert_eq!(spec.event_for(&value), Event::Done);
        assert!(spec.commits(&value));
    }
}
