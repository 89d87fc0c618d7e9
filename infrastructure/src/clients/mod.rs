//! Outbound HTTP adapters

pub mod embed;
pub mod feed;
pub mod retry;
pub mod scrape;
pub mod search;

pub use embed::HttpEmbedClient;
pub use feed::HttpQueryFeed;
pub use scrape::HttpScrapeClient;
pub use search::HttpSearchClient;
