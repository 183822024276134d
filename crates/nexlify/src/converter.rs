//! Single-page conversion: crawl, render, post-process

use crate::convert::MarkdownRenderer;
use crate::crawler::{CrawlOptions, Crawler};
use crate::error::{Error, Result};
use crate::links::strip_links;
use crate::types::ContentMode;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Options applied to one page
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    pub exclude_links: bool,
    pub data_type: ContentMode,
    pub enable_crawling: bool,
}

/// Markdown produced for one page
#[derive(Debug, Clone, Default)]
pub struct ConvertedPage {
    pub markdown: String,
    pub title: Option<String>,
    /// Same-site pages reported by the crawler
    pub discovered: Vec<Url>,
}

/// Turns one URL into Markdown using a crawler and a renderer
#[derive(Clone)]
pub struct PageConverter {
    crawler: Arc<dyn Crawler>,
    renderer: Arc<dyn MarkdownRenderer>,
}

impl PageConverter {
    pub fn new(crawler: Arc<dyn Crawler>, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        Self { crawler, renderer }
    }

    /// Convert the page at `url`
    ///
    /// Crawl failures surface as [`Error::Fetch`]; an empty rendering is
    /// an [`Error::Conversion`]. Nothing is retried.
    pub async fn convert(&self, url: &Url, options: &ConvertOptions) -> Result<ConvertedPage> {
        let crawl_options = CrawlOptions {
            enable_crawling: options.enable_crawling,
        };

        let page = self.crawler.crawl(url, &crawl_options).await?;

        let rendered = self.renderer.render(&page.html, options.data_type)?;
        let markdown = if options.exclude_links {
            strip_links(&rendered)
        } else {
            rendered
        };

        if markdown.trim().is_empty() {
            return Err(Error::Conversion(format!(
                "no {} content extracted from {}",
                options.data_type, url
            )));
        }

        debug!(
            url = %url,
            crawler = self.crawler.name(),
            renderer = self.renderer.name(),
            bytes = markdown.len(),
            "page converted"
        );

        Ok(ConvertedPage {
            markdown,
            title: page.title,
            discovered: page.discovered,
        })
    }
}
