//! Document entity
//!
//! A document is a web page discovered by the search stage. It is created
//! `Unprocessed`, becomes `Processed` once its content has been embedded and
//! published, or `Blacklisted` (with an expiration) when the url turned out
//! to be unsafe or unusable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::{Lifecycle, NOT_BLACKLISTED};
use super::status::ProcessingStatus;

/// A document's structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identity key
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub status: ProcessingStatus,
    #[serde(default = "default_blacklist_expiration")]
    pub blacklist_expiration: i64,
    /// Ordered text chunks extracted from the scraped page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_chunks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_blacklist_expiration() -> i64 {
    NOT_BLACKLISTED
}

impl Document {
    /// Create a new unprocessed document.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
            content: None,
            publisher: None,
            author: None,
            publication_date: None,
            modification_date: None,
            doc_type: None,
            status: ProcessingStatus::Unprocessed,
            blacklist_expiration: NOT_BLACKLISTED,
            text_chunks: None,
            error: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_publication_date(mut self, date: DateTime<Utc>) -> Self {
        self.publication_date = Some(date);
        self
    }

    /// Blacklist the document until the given epoch-second timestamp.
    pub fn blacklist_until(&mut self, expiration: i64) {
        self.status = ProcessingStatus::Blacklisted;
        self.blacklist_expiration = expiration;
    }

    /// Blacklist a document forever. Should only be used when the url is unsafe.
    pub fn blacklist_forever(&mut self) {
        self.blacklist_until(i64::MAX);
    }
}

impl Lifecycle for Document {
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

/// Parse a date string at a deserialization boundary.
///
/// Accepts RFC 3339 ("2024-05-01T12:00:00Z") and plain dates ("2024-05-01");
/// anything else yields `None` rather than an error, matching the lenient
/// handling of scraped metadata.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(DateTime::from_naive_utc_and_offset(
            date.and_hms_opt(0, 0, 0)?,
            Utc,
        ));
    }
    None
}
