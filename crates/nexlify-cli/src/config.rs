//! Command line configuration shared by the subcommands

use clap::Args;
use nexlify::{BatchOrchestrator, ContentMode, ConversionRequest, FileStore, HttpCrawler};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default directory for converted files
pub const DEFAULT_STORAGE_DIR: &str = "converted";

/// Crawler and batch settings
#[derive(Args, Debug, Clone)]
pub struct CrawlerArgs {
    /// Custom User-Agent
    #[arg(long, env = "NEXLIFY_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "NEXLIFY_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Fetch pages even when robots.txt disallows them
    #[arg(long, env = "NEXLIFY_IGNORE_ROBOTS")]
    pub ignore_robots: bool,

    /// Pages converted concurrently per batch
    #[arg(long, env = "NEXLIFY_MAX_CONCURRENCY", default_value_t = nexlify::batch::DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Sitemap pages converted per batch when crawling is enabled
    #[arg(long, env = "NEXLIFY_MAX_CRAWL_PAGES", default_value_t = nexlify::batch::DEFAULT_MAX_CRAWL_PAGES)]
    pub max_crawl_pages: usize,
}

impl CrawlerArgs {
    /// Build an orchestrator writing to `store`
    pub fn orchestrator(&self, store: FileStore) -> nexlify::Result<BatchOrchestrator> {
        let mut crawler = HttpCrawler::builder()
            .timeout(Duration::from_secs(self.timeout_secs.max(1)))
            .respect_robots(!self.ignore_robots);
        if let Some(ref ua) = self.user_agent {
            crawler = crawler.user_agent(ua.clone());
        }

        BatchOrchestrator::builder(store)
            .crawler(Arc::new(crawler.build()?))
            .max_concurrency(self.max_concurrency)
            .max_crawl_pages(self.max_crawl_pages)
            .build()
    }
}

/// `serve` settings
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "NEXLIFY_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Directory where converted files are stored
    #[arg(long, env = "NEXLIFY_STORAGE_DIR", default_value = DEFAULT_STORAGE_DIR)]
    pub storage_dir: PathBuf,

    /// Allowed CORS origin ("*" allows any); repeatable
    #[arg(
        long = "cors-origin",
        env = "NEXLIFY_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub cors_origins: Vec<String>,

    /// Delete stored files older than this many hours (disabled when unset)
    #[arg(long, env = "NEXLIFY_RETENTION_HOURS")]
    pub retention_hours: Option<u64>,

    #[command(flatten)]
    pub crawler: CrawlerArgs,
}

impl ServeArgs {
    pub fn retention(&self) -> Option<Duration> {
        self.retention_hours
            .map(|hours| Duration::from_secs(hours.saturating_mul(3600)))
    }
}

/// `convert` settings
#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// URLs to convert
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Directory where converted files are stored
    #[arg(long, env = "NEXLIFY_STORAGE_DIR", default_value = DEFAULT_STORAGE_DIR)]
    pub storage_dir: PathBuf,

    /// Strip hyperlinks from the Markdown
    #[arg(long)]
    pub exclude_links: bool,

    /// Also convert same-site pages listed in each site's sitemap
    #[arg(long)]
    pub enable_crawling: bool,

    /// Content to keep: full-page, text-only or headings-only
    #[arg(long, default_value = "full-page")]
    pub data_type: ContentMode,

    #[command(flatten)]
    pub crawler: CrawlerArgs,
}

impl ConvertArgs {
    pub fn request(&self) -> ConversionRequest {
        ConversionRequest {
            urls: self.urls.clone(),
            enable_crawling: self.enable_crawling,
            exclude_links: self.exclude_links,
            data_type: self.data_type,
        }
    }
}
