//! Core types for Nexlify

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use url::Url;

/// Which part of a page ends up in the Markdown artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ContentMode {
    /// Full Markdown rendering
    #[default]
    FullPage,
    /// Plain text, no Markdown markup
    TextOnly,
    /// Heading lines only
    HeadingsOnly,
}

impl FromStr for ContentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-page" => Ok(ContentMode::FullPage),
            "text-only" => Ok(ContentMode::TextOnly),
            "headings-only" => Ok(ContentMode::HeadingsOnly),
            _ => Err(
                "Invalid data type: must be full-page, text-only or headings-only".to_string(),
            ),
        }
    }
}

impl std::fmt::Display for ContentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentMode::FullPage => write!(f, "full-page"),
            ContentMode::TextOnly => write!(f, "text-only"),
            ContentMode::HeadingsOnly => write!(f, "headings-only"),
        }
    }
}

/// Request to convert a batch of URLs
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConversionRequest {
    /// URLs to convert (at least one, each http:// or https://)
    pub urls: Vec<String>,

    /// Also convert same-site pages listed in the site's sitemap
    #[serde(default)]
    pub enable_crawling: bool,

    /// Strip hyperlink markup from the generated Markdown
    #[serde(default)]
    pub exclude_links: bool,

    /// Content selection (default "full-page")
    #[serde(default)]
    pub data_type: ContentMode,
}

impl ConversionRequest {
    /// Create a request for the given URLs
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Enable sitemap expansion
    pub fn enable_crawling(mut self) -> Self {
        self.enable_crawling = true;
        self
    }

    /// Strip links from the output
    pub fn exclude_links(mut self) -> Self {
        self.exclude_links = true;
        self
    }

    /// Set the content mode
    pub fn data_type(mut self, mode: ContentMode) -> Self {
        self.data_type = mode;
        self
    }

    /// Check the request shape and parse every URL
    ///
    /// Rejects an empty list, unparsable URLs and non-HTTP schemes.
    pub fn validate(&self) -> Result<Vec<Url>> {
        if self.urls.is_empty() {
            return Err(Error::Validation(
                "at least one URL is required".to_string(),
            ));
        }

        self.urls
            .iter()
            .map(|raw| parse_http_url(raw))
            .collect()
    }
}

/// Parse an absolute http(s) URL
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("URL must not be empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| Error::Validation(format!("malformed URL {trimmed:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(Error::Validation(format!(
            "URL {trimmed:?} must start with http:// or https://"
        ))),
    }
}

/// Per-URL outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Manifest entry for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConversionResult {
    /// Source URL as requested
    pub url: String,

    /// Derived artifact name
    pub filename: String,

    /// Whether the artifact was produced
    pub outcome: Outcome,

    /// Page title, when the page declared one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn succeeded(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            outcome: Outcome::Succeeded,
            title: None,
            error: None,
        }
    }

    pub fn failed(
        url: impl Into<String>,
        filename: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            outcome: Outcome::Failed,
            title: None,
            error: Some(error.into()),
        }
    }

    /// Attach the page title
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }
}

/// Overall batch status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Success,
}

/// Response to a batch conversion
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    /// Always "success" once the request passed validation
    pub status: BatchStatus,

    /// One entry per requested URL, in request order
    pub files: Vec<ConversionResult>,

    /// Pages found through sitemap expansion
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovered: Vec<ConversionResult>,

    /// Human readable summary
    pub message: String,
}

impl BatchReport {
    /// Number of successful entries across requested and discovered pages
    pub fn succeeded(&self) -> usize {
        self.files
            .iter()
            .chain(self.discovered.iter())
            .filter(|r| r.is_success())
            .count()
    }
}

/// Metadata of a stored artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactInfo {
    pub filename: String,

    /// Size in bytes
    pub size: u64,

    /// Time of the last write
    pub created_at: DateTime<Utc>,
}
