//! Sitemap crawler and page fetcher.
//!
//! # Sitemap indexing
//!
//! [`SitemapCrawler::crawl`] walks a sitemap index breadth-first. Each level
//! of child sitemaps is fetched in batches of `batch_size` requests that run
//! concurrently; batches run one after another. The walk stops at whichever
//! limit is hit first:
//!
//! - `max_depth` - nesting below the root (root = 0)
//! - `max_sitemaps` - sitemap documents fetched, root included
//! - `max_urls` - distinct page URLs collected
//!
//! A sitemap location is fetched at most once per run, so index cycles
//! terminate. Only a failure of the root document is an error; failed child
//! sitemaps are counted and skipped.

mod error;
pub mod page;
pub mod sitemap;

use std::collections::HashSet;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::CrawlerConfig;

pub use error::CrawlError;
pub use page::{DEFAULT_MAX_CHARS, PageContent, extract_page};
pub use sitemap::{SitemapDocument, SitemapUrl, normalize_loc, parse_sitemap, robots_sitemaps};

/// Result of one sitemap index run.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapReport {
    /// Root sitemap URL the run started from.
    pub root: String,
    /// Distinct page URLs in first-seen order.
    pub urls: Vec<SitemapUrl>,
    /// Sitemap documents fetched successfully or not, root included.
    pub sitemaps_fetched: usize,
    /// Child sitemaps that failed to fetch or parse.
    pub failed_sitemaps: usize,
    /// Whether a limit stopped the walk before it was complete.
    pub truncated: bool,
}

/// Accumulates page URLs under the URL cap.
struct UrlCollector {
    max_urls: usize,
    seen: HashSet<String>,
    urls: Vec<SitemapUrl>,
    truncated: bool,
}

impl UrlCollector {
    fn new(max_urls: usize) -> Self {
        Self {
            max_urls,
            seen: HashSet::new(),
            urls: Vec::new(),
            truncated: false,
        }
    }

    fn is_full(&self) -> bool {
        self.urls.len() >= self.max_urls
    }

    fn extend(&mut self, entries: Vec<SitemapUrl>) {
        for entry in entries {
            let Some(loc) = normalize_loc(&entry.loc) else {
                debug!(loc = %entry.loc, "Skipping non-http sitemap entry");
                continue;
            };
            if self.seen.contains(&loc) {
                continue;
            }
            if self.is_full() {
                self.truncated = true;
                return;
            }
            self.seen.insert(loc.clone());
            self.urls.push(SitemapUrl {
                loc,
                lastmod: entry.lastmod.filter(|m| !m.is_empty()),
            });
        }
    }
}

/// Fetches sitemaps and pages with the crawler's limits and user agent.
#[derive(Clone)]
pub struct SitemapCrawler {
    client: reqwest::Client,
    config: CrawlerConfig,
}

impl SitemapCrawler {
    /// Create a crawler with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Http` if the HTTP client cannot be built.
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Current limits.
    #[must_use]
    pub const fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Same crawler with a different URL cap.
    #[must_use]
    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.config.max_urls = max_urls.max(1);
        self
    }

    /// Resolve the sitemap to index for a site.
    ///
    /// Order: `explicit`, then `configured`, then the first `Sitemap:` line
    /// of `{origin}/robots.txt`, then `{origin}/sitemap.xml`. Blank values
    /// count as absent.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::InvalidUrl` if the chosen URL is not http(s).
    #[instrument(skip(self))]
    pub async fn discover(
        &self,
        origin: &str,
        explicit: Option<&str>,
        configured: Option<&str>,
    ) -> Result<String, CrawlError> {
        let non_blank = |u: &&str| !u.trim().is_empty();
        if let Some(url) = explicit.filter(non_blank).or(configured.filter(non_blank)) {
            return normalize_loc(url).ok_or_else(|| CrawlError::InvalidUrl(url.to_string()));
        }

        let origin = origin.trim_end_matches('/');
        let robots_url = format!("{origin}/robots.txt");
        match self.fetch_text(&robots_url).await {
            Ok(robots) => {
                if let Some(url) = robots_sitemaps(&robots)
                    .into_iter()
                    .find_map(|u| normalize_loc(&u))
                {
                    debug!(sitemap = %url, "Sitemap found in robots.txt");
                    return Ok(url);
                }
            }
            Err(e) => debug!(error = %e, "robots.txt unavailable"),
        }

        let fallback = format!("{origin}/sitemap.xml");
        normalize_loc(&fallback).ok_or(CrawlError::InvalidUrl(fallback))
    }

    /// Walk a sitemap (index) and collect page URLs.
    ///
    /// # Errors
    ///
    /// Returns an error only if the root sitemap cannot be fetched or parsed.
    #[instrument(skip(self), fields(max_urls = self.config.max_urls))]
    pub async fn crawl(&self, root_url: &str) -> Result<SitemapReport, CrawlError> {
        let root =
            normalize_loc(root_url).ok_or_else(|| CrawlError::InvalidUrl(root_url.to_string()))?;

        let mut visited = HashSet::from([root.clone()]);
        let mut collector = UrlCollector::new(self.config.max_urls);
        let mut sitemaps_fetched = 1;
        let mut failed_sitemaps = 0;
        let mut limited = false;

        let mut level = Vec::new();
        self.absorb(
            self.fetch_sitemap(&root).await?,
            0,
            &mut visited,
            &mut collector,
            &mut level,
            &mut limited,
        );

        let mut depth = 1;
        while !level.is_empty() {
            let mut next_level = Vec::new();

            for batch in level.chunks(self.config.batch_size) {
                if collector.is_full() {
                    limited = true;
                    break;
                }
                let budget = self.config.max_sitemaps.saturating_sub(sitemaps_fetched);
                if budget == 0 {
                    limited = true;
                    break;
                }
                let batch = if batch.len() > budget {
                    limited = true;
                    batch.get(..budget).unwrap_or_default()
                } else {
                    batch
                };

                debug!(depth, size = batch.len(), "Fetching sitemap batch");
                let results = join_all(batch.iter().map(|loc| self.fetch_sitemap(loc))).await;
                sitemaps_fetched += batch.len();

                for (loc, result) in batch.iter().zip(results) {
                    match result {
                        Ok(doc) => self.absorb(
                            doc,
                            depth,
                            &mut visited,
                            &mut collector,
                            &mut next_level,
                            &mut limited,
                        ),
                        Err(e) => {
                            warn!(sitemap = %loc, error = %e, "Skipping child sitemap");
                            failed_sitemaps += 1;
                        }
                    }
                }
            }

            if limited && (collector.is_full() || sitemaps_fetched >= self.config.max_sitemaps) {
                break;
            }
            level = next_level;
            depth += 1;
        }

        let report = SitemapReport {
            root,
            truncated: limited || collector.truncated,
            urls: collector.urls,
            sitemaps_fetched,
            failed_sitemaps,
        };
        info!(
            urls = report.urls.len(),
            sitemaps = report.sitemaps_fetched,
            failed = report.failed_sitemaps,
            truncated = report.truncated,
            "Sitemap indexed"
        );
        Ok(report)
    }

    /// Fold one fetched document into the run state.
    fn absorb(
        &self,
        doc: SitemapDocument,
        depth: usize,
        visited: &mut HashSet<String>,
        collector: &mut UrlCollector,
        next_level: &mut Vec<String>,
        limited: &mut bool,
    ) {
        match doc {
            SitemapDocument::UrlSet(urls) => collector.extend(urls),
            SitemapDocument::Index(children) => {
                let children: Vec<String> = children
                    .iter()
                    .filter_map(|c| normalize_loc(c))
                    .filter(|c| !visited.contains(c))
                    .collect();
                if children.is_empty() {
                    return;
                }
                if depth >= self.config.max_depth {
                    debug!(depth, skipped = children.len(), "Sitemap depth limit reached");
                    *limited = true;
                    return;
                }
                for child in children {
                    if visited.insert(child.clone()) {
                        next_level.push(child);
                    }
                }
            }
        }
    }

    /// Fetch and parse one sitemap document.
    ///
    /// # Errors
    ///
    /// Returns a `CrawlError` for network, status or parse failures.
    pub async fn fetch_sitemap(&self, url: &str) -> Result<SitemapDocument, CrawlError> {
        let body = self.fetch_text(url).await?;
        parse_sitemap(&body)
    }

    /// Fetch a page and extract its text.
    ///
    /// # Errors
    ///
    /// Returns a `CrawlError` for network or status failures.
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, url: &str) -> Result<PageContent, CrawlError> {
        let html = self.fetch_text(url).await?;
        Ok(extract_page(url, &html, DEFAULT_MAX_CHARS))
    }

    async fn fetch_text(&self, url: &str) -> Result<String, CrawlError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(loc: &str) -> SitemapUrl {
        SitemapUrl {
            loc: loc.to_string(),
            lastmod: None,
        }
    }

    #[test]
    fn test_collector_dedupes_and_keeps_order() {
        let mut collector = UrlCollector::new(10);
        collector.extend(vec![
            url("https://a.test/2"),
            url("https://a.test/1"),
            url(" https://a.test/2#reviews"),
            url("javascript:void(0)"),
        ]);
        let locs: Vec<_> = collector.urls.iter().map(|u| u.loc.as_str()).collect();
        assert_eq!(locs, vec!["https://a.test/2", "https://a.test/1"]);
        assert!(!collector.truncated);
    }

    #[test]
    fn test_collector_truncates_at_cap() {
        let mut collector = UrlCollector::new(2);
        collector.extend(vec![
            url("https://a.test/1"),
            url("https://a.test/2"),
            url("https://a.test/1"),
        ]);
        assert!(collector.is_full());
        assert!(!collector.truncated);

        collector.extend(vec![url("https://a.test/3")]);
        assert!(collector.truncated);
        assert_eq!(collector.urls.len(), 2);
    }

    #[test]
    fn test_with_max_urls_never_zero() {
        let crawler = SitemapCrawler::new(CrawlerConfig::default())
            .map(|c| c.with_max_urls(0))
            .ok();
        assert_eq!(crawler.map(|c| c.config().max_urls), Some(1));
    }
}
