//! Crawl capability: acquiring page HTML
//!
//! Design: the converter only sees the [`Crawler`] trait. [`HttpCrawler`]
//! is the built-in implementation; it enforces robots.txt itself and, when
//! asked to crawl, reports same-site pages found in the site's sitemap.

mod http;
pub mod robots;
pub mod sitemap;

pub use http::{HttpCrawler, HttpCrawlerBuilder};

use crate::error::FetchError;
use async_trait::async_trait;
use url::Url;

/// Per-request crawl options
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlOptions {
    /// Discover additional same-site pages from the sitemap
    pub enable_crawling: bool,
}

/// A successfully acquired page
#[derive(Debug, Clone, Default)]
pub struct CrawledPage {
    /// Final URL of the page
    pub url: String,
    /// Raw HTML
    pub html: String,
    /// Content of the `<title>` element
    pub title: Option<String>,
    /// Same-site pages found through sitemap discovery
    pub discovered: Vec<Url>,
}

/// Trait for page acquisition backends
///
/// Implementations apply their own robots.txt and sitemap policies.
/// Any unsuccessful acquisition (non-2xx status, timeout, connection
/// failure, policy refusal) is reported as a [`FetchError`].
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Unique identifier for this crawler (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Fetch the page at `url`
    async fn crawl(&self, url: &Url, options: &CrawlOptions) -> Result<CrawledPage, FetchError>;
}
