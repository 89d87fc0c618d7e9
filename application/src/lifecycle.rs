//! Collection lifecycle helpers
//!
//! Shared operations over anything with a processing lifecycle: merging new
//! entries without resurrecting frozen ones, and the two sampling policies
//! the pipeline uses. All of them are deterministic so that every
//! participant derives the same result from the same synchronized inputs.

use std::collections::BTreeSet;

use researcher_domain::{ContentHash, Lifecycle, Query};

/// Keys of all entries frozen at `now`.
pub fn frozen_keys<T: Lifecycle>(items: &[T], now: i64) -> BTreeSet<String> {
    items
        .iter()
        .filter(|item| item.is_frozen(now))
        .map(|item| item.key().to_string())
        .collect()
}

/// Number of entries still open for processing at `now`.
pub fn num_unfrozen<T: Lifecycle>(items: &[T], now: i64) -> usize {
    items.iter().filter(|item| !item.is_frozen(now)).count()
}

/// Merge incoming entries into the collection, keyed by URL. Entries whose
/// key is already present are dropped, frozen or not; existing state always
/// wins. Returns how many entries were added.
pub fn merge_new<T: Lifecycle>(existing: &mut Vec<T>, incoming: Vec<T>) -> usize {
    let known: BTreeSet<String> = existing.iter().map(|item| item.key().to_string()).collect();
    let mut added = 0;
    for item in incoming {
        if known.contains(item.key()) {
            continue;
        }
        existing.push(item);
        added += 1;
    }
    added
}

/// Pick the open query with the oldest publication date. Undated queries
/// sort last; ties break on URL so the choice is stable.
pub fn sample_oldest(queries: &[Query], now: i64) -> Option<&Query> {
    queries
        .iter()
        .filter(|query| !query.is_frozen(now))
        .min_by(|a, b| {
            let a_date = (a.publication_date.is_none(), a.publication_date);
            let b_date = (b.publication_date.is_none(), b.publication_date);
            a_date.cmp(&b_date).then_with(|| a.url.cmp(&b.url))
        })
}

/// Pick an open entry by shared randomness: hash the seed and index into
/// the open entries sorted by key.
pub fn sample_seeded<'a, T: Lifecycle>(items: &'a [T], now: i64, seed: &str) -> Option<&'a T> {
    let mut open: Vec<&T> = items.iter().filter(|item| !item.is_frozen(now)).collect();
    if open.is_empty() {
        return None;
    }
    open.sort_by(|a, b| a.key().cmp(b.key()));

    let digest = ContentHash::of_bytes(seed.as_bytes());
    // First 16 hex chars of the digest give a uniform 64-bit index.
    let index = u64::from_str_radix(&digest.as_str()[..16], 16).unwrap_or(0);
    Some(open[(index as usize) % open.len()])
}
