//! Query entity
//!
//! A query is a pending research question waiting to be sampled and handed
//! to the search stage. Same shape as [`Document`](super::document::Document)
//! minus the scraping fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::{Lifecycle, NOT_BLACKLISTED};
use super::status::ProcessingStatus;

/// A research query's structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Identity key
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ProcessingStatus,
    #[serde(default = "default_blacklist_expiration")]
    pub blacklist_expiration: i64,
}

fn default_blacklist_expiration() -> i64 {
    NOT_BLACKLISTED
}

impl Query {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
            publisher: None,
            author: None,
            publication_date: None,
            modification_date: None,
            status: ProcessingStatus::Unprocessed,
            blacklist_expiration: NOT_BLACKLISTED,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_publication_date(mut self, date: DateTime<Utc>) -> Self {
        self.publication_date = Some(date);
        self
    }

    /// The text dispatched to the search engine: the title when present,
    /// otherwise the url key.
    pub fn search_text(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

impl Lifecycle for Query {
    fn key(&self) -> &str {
        &self.url
    }

    fn status(&self) -> ProcessingStatus {
        self.status
    }

    fn set_status(&mut self, status: ProcessingStatus) {
        self.status = status;
    }

    fn blacklist_expiration(&self) -> i64 {
        self.blacklist_expiration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_search_text_prefers_title() {
        let query = Query::new("topic:rust-consensus").with_title("rust consensus protocols");
        assert_eq!(query.search_text(), "rust consensus protocols");

        let bare = Query::new("topic:rust-consensus");
        assert_eq!(bare.search_text(), "topic:rust-consensus");
    }

    #[test]
    fn test_query_freeze_follows_shared_rule() {
        let mut query = Query::new("topic:a");
        query.set_status(ProcessingStatus::Processed);
        assert!(query.is_frozen(0));
    }

    #[test]
    fn test_publication_date_round_trip() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let query = Query::new("topic:a").with_publication_date(date);
        let json = serde_json::to_string(&query).unwrap();
        let back: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(back.publication_date, Some(date));
    }
}
