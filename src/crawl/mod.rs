// src/crawl/mod.rs
// =============================================================================
// Help-center crawling.
//
// Features:
// - Breadth-first crawling from a start URL, one page at a time
// - Same-site restriction (host plus explicit port of the start URL)
// - URL normalization: query strings and fragments never create new pages
// - FAQ extraction from a fixed, configurable page layout
// - Politeness delay before every request and a hard page ceiling
//
// Submodules:
// - url: validation and normalization
// - extract: question/answer and link extraction from parsed HTML
// - fetch: single-page fetch with typed outcomes and charset decoding
// - engine: the crawl loop and the save step
// - config / error: settings and error types
// =============================================================================

mod config;
mod engine;
mod error;
mod extract;
mod fetch;
mod url;

use serde::{Deserialize, Serialize};

pub use config::{
    CrawlerConfig, MarkupRules, DEFAULT_IGNORED_EXTENSIONS, DEFAULT_MAX_PAGES, DEFAULT_USER_AGENT,
};
pub use engine::crawl_and_save;
pub use error::CrawlError;
pub use url::is_valid_url;

/// One question/answer pair and the page it came from
///
/// Serialized as `{"question": ..., "answer": ..., "url": ...}`. Missing keys
/// in a loaded file become empty strings so callers can skip those entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqRecord {
    /// Question heading text
    #[serde(default)]
    pub question: String,
    /// Answer text, one line per text block
    #[serde(default)]
    pub answer: String,
    /// Normalized URL of the page
    #[serde(default)]
    pub url: String,
}
