//! Default HTTP crawler
//!
//! Fetches pages over HTTP/HTTPS with reqwest, checking robots.txt first
//! and optionally discovering further pages from the site's sitemap.

use super::robots::RobotsCache;
use super::sitemap;
use super::{CrawlOptions, CrawledPage, Crawler};
use crate::convert::{extract_title, is_html};
use crate::error::FetchError;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Binary content type prefixes
const BINARY_PREFIXES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "application/octet-stream",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-tar",
    "application/x-rar",
    "application/x-7z",
    "application/vnd.ms-",
    "application/vnd.openxmlformats",
    "font/",
];

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default total request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`HttpCrawler`]
#[derive(Debug, Clone)]
pub struct HttpCrawlerBuilder {
    user_agent: Option<String>,
    timeout: Duration,
    respect_robots: bool,
}

impl Default for HttpCrawlerBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
            respect_robots: true,
        }
    }
}

impl HttpCrawlerBuilder {
    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the total per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable robots.txt checks
    pub fn respect_robots(mut self, respect: bool) -> Self {
        self.respect_robots = respect;
        self
    }

    /// Build the crawler
    pub fn build(self) -> Result<HttpCrawler, FetchError> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT.min(self.timeout))
            .timeout(self.timeout)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        Ok(HttpCrawler {
            client,
            timeout: self.timeout,
            respect_robots: self.respect_robots,
            robots: RobotsCache::new(user_agent.clone()),
            user_agent,
        })
    }
}

/// Default HTTP crawler
///
/// Handles all HTTP/HTTPS URLs with:
/// - robots.txt enforcement (cached per origin)
/// - non-2xx statuses and binary content reported as errors
/// - sitemap discovery when crawling is enabled
pub struct HttpCrawler {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
    respect_robots: bool,
    robots: RobotsCache,
}

impl HttpCrawler {
    /// Create a crawler with default settings
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    /// Create a new crawler builder
    pub fn builder() -> HttpCrawlerBuilder {
        HttpCrawlerBuilder::default()
    }

    /// User-Agent sent with every request
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl Crawler for HttpCrawler {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn crawl(&self, url: &Url, options: &CrawlOptions) -> Result<CrawledPage, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrlScheme);
        }

        if self.respect_robots && !self.robots.is_allowed(&self.client, url).await {
            debug!(url = %url, "blocked by robots.txt");
            return Err(FetchError::DisallowedByRobots);
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ref ct) = content_type {
            if is_binary_content_type(ct) {
                return Err(FetchError::NotHtml(ct.clone()));
            }
        }

        let body = read_body_with_timeout(response, self.timeout)
            .await
            .inspect_err(|e| warn!(url = %url, error = %e, "failed to read body"))?;

        let html = String::from_utf8_lossy(&body).to_string();

        // Plain text and other textual types are not pages
        if let Some(ref ct) = content_type {
            if !is_html(&content_type, &html) && !ct.to_lowercase().starts_with("text/") {
                return Err(FetchError::NotHtml(ct.clone()));
            }
        }

        let discovered = if options.enable_crawling {
            sitemap::discover(&self.client, url).await
        } else {
            Vec::new()
        };

        debug!(
            url = %url,
            bytes = body.len(),
            discovered = discovered.len(),
            "page fetched"
        );

        Ok(CrawledPage {
            url: final_url,
            title: extract_title(&html),
            html,
            discovered,
        })
    }
}

/// Check if content type indicates binary content
fn is_binary_content_type(content_type: &str) -> bool {
    let ct_lower = content_type.to_lowercase();
    BINARY_PREFIXES
        .iter()
        .any(|prefix| ct_lower.starts_with(prefix))
}

/// Read the full response body before `timeout` elapses
///
/// A stalled or broken body is a fetch failure; partial pages are never returned.
async fn read_body_with_timeout(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<Bytes, FetchError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let chunk_future = stream.next();
        let timeout_future = tokio::time::sleep_until(deadline);

        tokio::select! {
            chunk = chunk_future => {
                match chunk {
                    Some(Ok(bytes)) => body.extend_from_slice(&bytes),
                    Some(Err(e)) => return Err(FetchError::from_reqwest(e)),
                    None => return Ok(Bytes::from(body)),
                }
            }
            _ = timeout_future => {
                debug!(bytes = body.len(), "body deadline reached");
                return Err(FetchError::Timeout);
            }
        }
    }
}
