//! Nexlify - web page to Markdown conversion
//!
//! This crate turns batches of URLs into Markdown files and bundles
//! stored files into ZIP archives. The HTTP API lives in `nexlify-cli`.
//!
//! ## Pipeline
//!
//! A [`ConversionRequest`] is run by the [`BatchOrchestrator`]:
//!
//! 1. each URL is fetched through a [`Crawler`] (default [`HttpCrawler`],
//!    robots.txt aware, optional sitemap discovery)
//! 2. the HTML is rendered by a [`MarkdownRenderer`] (default [`HtmlRenderer`])
//! 3. links are optionally stripped ([`strip_links`])
//! 4. the result is written to the [`FileStore`] under a name derived
//!    from the URL ([`derive_filename`])
//!
//! Failures are recorded per URL in the returned [`BatchReport`].
//!
//! ```no_run
//! use nexlify::{BatchOrchestrator, ConversionRequest, FileStore};
//!
//! # async fn run() -> nexlify::Result<()> {
//! let orchestrator = BatchOrchestrator::builder(FileStore::new("converted")).build()?;
//! let report = orchestrator
//!     .run(&ConversionRequest::new(["https://example.com/docs"]).exclude_links())
//!     .await?;
//! println!("{}", report.message);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod batch;
mod convert;
pub mod converter;
pub mod crawler;
mod error;
pub mod filename;
mod links;
pub mod store;
mod types;

pub use archive::{archive_filename, build_archive};
pub use batch::{BatchOrchestrator, BatchOrchestratorBuilder};
pub use convert::{html_to_markdown, html_to_text, HtmlRenderer, MarkdownRenderer};
pub use converter::{ConvertOptions, ConvertedPage, PageConverter};
pub use crawler::{CrawlOptions, CrawledPage, Crawler, HttpCrawler, HttpCrawlerBuilder};
pub use error::{Error, FetchError, Result};
pub use filename::{derive_filename, validate_filename};
pub use links::strip_links;
pub use store::FileStore;
pub use types::{
    parse_http_url, ArtifactInfo, BatchReport, BatchStatus, ContentMode, ConversionRequest,
    ConversionResult, Outcome,
};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "Nexlify/1.0";
