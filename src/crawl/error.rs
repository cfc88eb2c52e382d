// src/crawl/error.rs
// =============================================================================
// Error types for crawling.
//
// CrawlError is the only kind of error that can stop a whole crawl, and it can
// only happen before the first fetch. PageError describes why a single page
// failed; the engine logs it and moves on.
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that abort a crawl before it starts
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Start URL has no scheme/host or could not be normalized
    #[error("invalid start URL: {0}")]
    InvalidStartUrl(String),

    /// A markup marker does not form a valid CSS selector
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Why a single page could not be processed
#[derive(Debug, Error)]
pub enum PageError {
    /// The fetch took longer than the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-success status (other than 404)
    #[error("HTTP {0}")]
    Status(StatusCode),

    /// Connection, TLS, redirect or other transport failure
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The body could not be read
    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),
}

impl PageError {
    // Classifies a reqwest error raised while sending the request
    pub fn from_send(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PageError::Timeout
        } else {
            PageError::Request(error)
        }
    }

    // Classifies a reqwest error raised while reading the body
    pub fn from_body(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PageError::Timeout
        } else {
            PageError::Body(error)
        }
    }
}
