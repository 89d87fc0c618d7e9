//! Synchronized key-value store
//!
//! The agreed, replicated state visible to all agents. A key becomes legible
//! only once the round that owns it has committed; commits happen exclusively
//! through round finalization, totally ordered by round completion. Each
//! round declares which keys it may read (pre-conditions) and which it
//! produces (post-conditions); reading an undeclared key is a programming
//! error surfaced as [`DomainError::UndeclaredKey`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::error::DomainError;
use crate::fsm::round_id::RoundId;

/// Store key names, the schema-by-convention of the pipeline.
pub mod keys {
    pub const QUERIES_HASH: &str = "queries_hash";
    pub const DOCUMENTS_HASH: &str = "documents_hash";
    pub const EMBEDDINGS_HASH: &str = "embeddings_hash";
    pub const NUM_UNPROCESSED: &str = "num_unprocessed";
    pub const SAMPLED_QUERY_URL: &str = "sampled_query_url";
    pub const SAMPLED_DOC_URL: &str = "sampled_doc_url";
    pub const WEB_SCRAPE_DATA: &str = "web_scrape_data";
    pub const NUM_TEXT_CHUNKS: &str = "num_text_chunks";
    pub const MANIFEST_HASH: &str = "manifest_hash";
    pub const SYNCED_TIME: &str = "synced_time";
}

/// One committed round, for auditing and ordering.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub seq: u64,
    pub round: RoundId,
    pub keys: Vec<String>,
    pub synced_time: i64,
}

/// Append-only, round-indexed key-value store.
#[derive(Debug, Default)]
pub struct SynchronizedStore {
    values: BTreeMap<String, Value>,
    history: Vec<CommitRecord>,
    synced_time: i64,
}

impl SynchronizedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an agreed round output. The only mutation path.
    pub fn commit(
        &mut self,
        seq: u64,
        round: RoundId,
        kvs: BTreeMap<String, Value>,
        synced_time: i64,
    ) {
        let keys: Vec<String> = kvs.keys().cloned().collect();
        for (key, value) in kvs {
            self.values.insert(key, value);
        }
        self.synced_time = synced_time;
        self.history.push(CommitRecord {
            seq,
            round,
            keys,
            synced_time,
        });
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_strict(&self, key: &str) -> Result<&Value, DomainError> {
        self.values
            .get(key)
            .ok_or_else(|| DomainError::MissingKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Last round-transition time agreed by all agents (epoch seconds).
    pub fn synced_time(&self) -> i64 {
        self.synced_time
    }

    pub fn history(&self) -> &[CommitRecord] {
        &self.history
    }

    /// A reader restricted to a round's declared pre-condition keys.
    pub fn reader<'a>(&'a self, allowed: &'static [&'static str]) -> StoreReader<'a> {
        StoreReader {
            store: self,
            allowed,
        }
    }

    /// Wipe agreed values at a session boundary. History is retained.
    pub fn reset_session(&mut self) {
        self.values.clear();
    }
}

/// Scoped read access for one round's local computation.
#[derive(Debug, Clone, Copy)]
pub struct StoreReader<'a> {
    store: &'a SynchronizedStore,
    allowed: &'static [&'static str],
}

impl<'a> StoreReader<'a> {
    fn check(&self, key: &str) -> Result<(), DomainError> {
        if self.allowed.contains(&key) {
            Ok(())
        } else {
            Err(DomainError::UndeclaredKey(key.to_string()))
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<&'a Value>, DomainError> {
        self.check(key)?;
        Ok(self.store.get(key))
    }

    pub fn get_strict(&self, key: &str) -> Result<&'a Value, DomainError> {
        self.check(key)?;
        self.store.get_strict(key)
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&'a str>, DomainError> {
        Ok(self.get(key)?.and_then(Value::as_str))
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, DomainError> {
        Ok(self.get(key)?.and_then(Value::as_u64))
    }

    /// Synced time is readable by every round.
    pub fn synced_time(&self) -> i64 {
        self.store.synced_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn commit_one(store: &mut SynchronizedStore, key: &str, value: Value, time: i64) {
        let mut kvs = BTreeMap::new();
        kvs.insert(key.to_string(), value);
        store.commit(store.history().len() as u64, RoundId::CheckDocuments, kvs, time);
    }

    #[test]
    fn test_commit_makes_key_legible() {
        let mut store = SynchronizedStore::new();
        assert!(store.get(keys::NUM_UNPROCESSED).is_none());
        commit_one(&mut store, keys::NUM_UNPROCESSED, json!(3), 100);
        assert_eq!(store.get_strict(keys::NUM_UNPROCESSED).unwrap(), &json!(3));
        assert_eq!(store.synced_time(), 100);
    }

    #[test]
    fn test_get_strict_missing_key() {
        let store = SynchronizedStore::new();
        let err = store.get_strict(keys::QUERIES_HASH).unwrap_err();
        assert!(matches!(err, DomainError::MissingKey(_)));
    }

    #[test]
    fn test_reader_rejects_undeclared_key() {
        let mut store = SynchronizedStore::new();
        commit_one(&mut store, keys::QUERIES_HASH, json!("abc"), 1);
        let reader = store.reader(&[keys::NUM_UNPROCESSED]);
        let err = reader.get(keys::QUERIES_HASH).unwrap_err();
        assert!(matches!(err, DomainError::UndeclaredKey(_)));
    }

    #[test]
    fn test_reader_allows_declared_key() {
        let mut store = SynchronizedStore::new();
        commit_one(&mut store, keys::QUERIES_HASH, json!("abc"), 1);
        let reader = store.reader(&[keys::QUERIES_HASH]);
        assert_eq!(reader.get_str(keys::QUERIES_HASH).unwrap(), Some("abc"));
    }

    #[test]
    fn test_history_preserves_commit_order() {
        let mut store = SynchronizedStore::new();
        commit_one(&mut store, keys::QUERIES_HASH, json!("a"), 1);
        commit_one(&mut store, keys::DOCUMENTS_HASH, json!("b"), 2);
        let seqs: Vec<u64> = store.history().iter().map(|record| record.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn test_reset_session_clears_values_not_history() {
        let mut store = SynchronizedStore::new();
        commit_one(&mut store, keys::QUERIES_HASH, json!("a"), 1);
        store.reset_session();
        assert!(store.get(keys::QUERIES_HASH).is_none());
        assert_eq!(store.history().len(), 1);
    }
}
