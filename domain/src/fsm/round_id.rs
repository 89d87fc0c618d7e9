//! Round identifiers

use serde::{Deserialize, Serialize};

/// The named rounds of the research pipeline.
///
/// Documents-manager rounds maintain the query/document collections;
/// scraper rounds work one sampled document through
/// scrape → extract → embed → publish. `Finished*`/`Failed*` rounds are
/// degenerate: they mark a terminal outcome and hand control back to the
/// surrounding composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundId {
    UpdateQueries,
    UpdateFiles,
    CheckDocuments,
    SampleQuery,
    SearchEngine,
    FinishedDocumentsManager,
    FailedDocumentsManager,
    Sampling,
    WebScrape,
    ProcessHtml,
    Embedding,
    Publish,
    FinishedScraper,
    FinishedWithoutScraping,
    FinishedWithoutEmbedding,
}

impl RoundId {
    /// Whether this is a degenerate (terminal) round.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RoundId::FinishedDocumentsManager
                | RoundId::FailedDocumentsManager
                | RoundId::FinishedScraper
                | RoundId::FinishedWithoutScraping
                | RoundId::FinishedWithoutEmbedding
        )
    }
}

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoundId::UpdateQueries => "update_queries",
            RoundId::UpdateFiles => "update_files",
            RoundId::CheckDocuments => "check_documents",
            RoundId::SampleQuery => "sample_query",
            RoundId::SearchEngine => "search_engine",
            RoundId::FinishedDocumentsManager => "finished_documents_manager",
            RoundId::FailedDocumentsManager => "failed_documents_manager",
            RoundId::Sampling => "sampling",
            RoundId::WebScrape => "web_scrape",
            RoundId::ProcessHtml => "process_html",
            RoundId::Embedding => "embedding",
            RoundId::Publish => "publish",
            RoundId::FinishedScraper => "finished_scraper",
            RoundId::FinishedWithoutScraping => "finished_without_scraping",
            RoundId::FinishedWithoutEmbedding => "finished_without_embedding",
        };
        write!(f, "{}", name)
    }
}
