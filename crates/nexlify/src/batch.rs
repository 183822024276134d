//! Batch orchestration of conversion requests

use crate::convert::{HtmlRenderer, MarkdownRenderer};
use crate::converter::{ConvertOptions, PageConverter};
use crate::crawler::{Crawler, HttpCrawler};
use crate::error::Result;
use crate::filename::derive_filename;
use crate::store::FileStore;
use crate::types::{BatchReport, BatchStatus, ConversionRequest, ConversionResult};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Default number of pages converted at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default cap on sitemap pages converted per batch
pub const DEFAULT_MAX_CRAWL_PAGES: usize = 20;

/// Builder for configuring a [`BatchOrchestrator`]
pub struct BatchOrchestratorBuilder {
    store: FileStore,
    crawler: Option<Arc<dyn Crawler>>,
    renderer: Option<Arc<dyn MarkdownRenderer>>,
    max_concurrency: usize,
    max_crawl_pages: usize,
}

impl BatchOrchestratorBuilder {
    /// Start a builder writing artifacts to `store`
    pub fn new(store: FileStore) -> Self {
        Self {
            store,
            crawler: None,
            renderer: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_crawl_pages: DEFAULT_MAX_CRAWL_PAGES,
        }
    }

    /// Use a custom crawler (default: [`HttpCrawler`])
    pub fn crawler(mut self, crawler: Arc<dyn Crawler>) -> Self {
        self.crawler = Some(crawler);
        self
    }

    /// Use a custom renderer (default: [`HtmlRenderer`])
    pub fn renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Maximum number of pages converted concurrently (at least 1)
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Maximum number of sitemap pages converted per batch
    pub fn max_crawl_pages(mut self, limit: usize) -> Self {
        self.max_crawl_pages = limit;
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Result<BatchOrchestrator> {
        let crawler = match self.crawler {
            Some(crawler) => crawler,
            None => Arc::new(HttpCrawler::new()?),
        };
        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(HtmlRenderer::new()));

        Ok(BatchOrchestrator {
            converter: PageConverter::new(crawler, renderer),
            store: self.store,
            max_concurrency: self.max_concurrency,
            max_crawl_pages: self.max_crawl_pages,
        })
    }
}

/// Runs conversion requests and records one manifest entry per URL
pub struct BatchOrchestrator {
    converter: PageConverter,
    store: FileStore,
    max_concurrency: usize,
    max_crawl_pages: usize,
}

impl BatchOrchestrator {
    /// Create a new builder
    pub fn builder(store: FileStore) -> BatchOrchestratorBuilder {
        BatchOrchestratorBuilder::new(store)
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Convert every URL of `request` and store the results
    ///
    /// Only an invalid request fails as a whole. Per-URL failures are
    /// recorded in the report and never stop the other URLs.
    pub async fn run(&self, request: &ConversionRequest) -> Result<BatchReport> {
        let urls = request.validate()?;
        let options = ConvertOptions {
            exclude_links: request.exclude_links,
            data_type: request.data_type,
            enable_crawling: request.enable_crawling,
        };

        info!(
            urls = urls.len(),
            enable_crawling = options.enable_crawling,
            exclude_links = options.exclude_links,
            data_type = %options.data_type,
            "batch started"
        );

        let jobs: Vec<(String, Url)> = request
            .urls
            .iter()
            .map(|raw| raw.trim().to_string())
            .zip(urls.iter().cloned())
            .collect();

        let processed: Vec<(ConversionResult, Vec<Url>)> = stream::iter(jobs)
            .map(|(raw, url)| async move { self.process(&raw, &url, &options).await })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut files = Vec::with_capacity(processed.len());
        let mut found = Vec::new();
        for (result, discovered) in processed {
            files.push(result);
            found.extend(discovered);
        }

        let discovered = if options.enable_crawling {
            self.convert_discovered(&urls, found, &options).await
        } else {
            Vec::new()
        };

        let mut report = BatchReport {
            status: BatchStatus::Success,
            files,
            discovered,
            message: String::new(),
        };
        let total = report.files.len() + report.discovered.len();
        report.message = format!(
            "Successfully processed {} of {} URLs",
            report.succeeded(),
            total
        );

        info!(succeeded = report.succeeded(), total, "batch finished");
        Ok(report)
    }

    /// Convert sitemap pages that were not part of the request, without further expansion
    async fn convert_discovered(
        &self,
        requested: &[Url],
        found: Vec<Url>,
        options: &ConvertOptions,
    ) -> Vec<ConversionResult> {
        let mut seen: HashSet<String> = requested.iter().map(|u| u.as_str().to_string()).collect();
        let pages: Vec<Url> = found
            .into_iter()
            .filter(|url| seen.insert(url.as_str().to_string()))
            .take(self.max_crawl_pages)
            .collect();

        if pages.is_empty() {
            return Vec::new();
        }
        info!(pages = pages.len(), "converting discovered pages");

        let options = ConvertOptions {
            enable_crawling: false,
            ..*options
        };

        stream::iter(pages)
            .map(|url| async move {
                let (result, _) = self.process(url.as_str(), &url, &options).await;
                result
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    async fn process(
        &self,
        raw: &str,
        url: &Url,
        options: &ConvertOptions,
    ) -> (ConversionResult, Vec<Url>) {
        let filename = derive_filename(url);

        let page = match self.converter.convert(url, options).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "conversion failed");
                return (ConversionResult::failed(raw, filename, e.to_string()), Vec::new());
            }
        };

        if let Err(e) = self.store.put(&filename, &page.markdown).await {
            warn!(url = %url, filename = %filename, error = %e, "failed to store artifact");
            return (ConversionResult::failed(raw, filename, e.to_string()), Vec::new());
        }

        (
            ConversionResult::succeeded(raw, filename).with_title(page.title),
            page.discovered,
        )
    }
}
