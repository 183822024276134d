//! Error types for Nexlify

use thiserror::Error;

/// Errors reported by a crawl capability for a single URL
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL has invalid scheme
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// robots.txt forbids fetching this URL
    #[error("URL not allowed by robots.txt")]
    DisallowedByRobots,

    /// Response body is not an HTML document
    #[error("Unsupported content type: {0}")]
    NotHtml(String),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),
}

impl FetchError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else {
            FetchError::RequestError(err.to_string())
        }
    }
}

/// Errors produced by the conversion pipeline, the file store and the archive builder
#[derive(Debug, Error)]
pub enum Error {
    /// Request rejected before any work was done
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Page could not be acquired
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// HTML could not be turned into Markdown
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// No stored artifact with this name
    #[error("File not found: {0}")]
    NotFound(String),

    /// Bulk download requested while nothing is stored
    #[error("No files available to archive")]
    EmptyArchive,

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP writer failure
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
