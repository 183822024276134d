//! Sitemap discovery
//!
//! Tries the conventional sitemap locations of a site in order and takes
//! the first one that answers 200. Sitemap indexes are followed one level.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// Paths probed for a sitemap, relative to the site origin
pub const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap/sitemap.xml"];

/// Upper bound on child sitemaps fetched from a sitemap index
const MAX_CHILD_SITEMAPS: usize = 10;

fn loc_pattern() -> &'static Regex {
    static LOC: OnceLock<Regex> = OnceLock::new();
    LOC.get_or_init(|| Regex::new(r"(?is)<loc>\s*(.*?)\s*</loc>").expect("valid regex"))
}

/// Parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sitemap {
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
    /// `<sitemapindex>`: locations of further sitemaps
    Index(Vec<String>),
}

/// Parse a sitemap XML document
pub fn parse_sitemap(xml: &str) -> Sitemap {
    let locs: Vec<String> = loc_pattern()
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_xml(m.as_str()))
        .filter(|loc| !loc.is_empty())
        .collect();

    if xml.to_ascii_lowercase().contains("<sitemapindex") {
        Sitemap::Index(locs)
    } else {
        Sitemap::UrlSet(locs)
    }
}

fn unescape_xml(value: &str) -> String {
    let value = value
        .trim()
        .trim_start_matches("<![CDATA[")
        .trim_end_matches("]]>");
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Keep absolute URLs on the same origin as `base`, in order, without duplicates
pub fn same_origin(base: &Url, locs: &[String]) -> Vec<Url> {
    let origin = base.origin();
    let mut seen = HashSet::new();

    locs.iter()
        .filter_map(|loc| Url::parse(loc).ok())
        .filter(|url| url.origin() == origin)
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Discover same-origin page URLs listed in the sitemap of `page`'s site
///
/// Failures are logged and produce an empty list; discovery never fails a crawl.
pub async fn discover(client: &reqwest::Client, page: &Url) -> Vec<Url> {
    for path in SITEMAP_PATHS {
        let Ok(sitemap_url) = page.join(path) else {
            continue;
        };

        let Some(body) = fetch_text(client, &sitemap_url).await else {
            continue;
        };

        let locs = match parse_sitemap(&body) {
            Sitemap::UrlSet(locs) => locs,
            Sitemap::Index(children) => {
                let mut locs = Vec::new();
                for child in same_origin(page, &children)
                    .into_iter()
                    .take(MAX_CHILD_SITEMAPS)
                {
                    if let Some(child_body) = fetch_text(client, &child).await {
                        if let Sitemap::UrlSet(child_locs) = parse_sitemap(&child_body) {
                            locs.extend(child_locs);
                        }
                    }
                }
                locs
            }
        };

        let urls = same_origin(page, &locs);
        debug!(sitemap = %sitemap_url, count = urls.len(), "sitemap discovered");
        return urls;
    }

    debug!(page = %page, "no sitemap found");
    Vec::new()
}

async fn fetch_text(client: &reqwest::Client, url: &Url) -> Option<String> {
    match client.get(url.as_str()).send().await {
        Ok(response) if response.status().is_success() => response.text().await.ok(),
        Ok(response) => {
            debug!(url = %url, status = response.status().as_u16(), "sitemap not available");
            None
        }
        Err(e) => {
            debug!(url = %url, error = %e, "failed to fetch sitemap");
            None
        }
    }
}
