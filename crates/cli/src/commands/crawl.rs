//! Sitemap indexing without the server.
//!
//! ```bash
//! cf-cli index-sitemap https://example.com/sitemap_index.xml --max-urls 200
//! ```
//!
//! Crawler limits come from the `CRAWLER_*` variables, as for the API.

use contentforge_api::config::{ConfigError, CrawlerConfig};
use contentforge_api::crawler::{CrawlError, SitemapCrawler, SitemapReport};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),
}

/// Crawl `sitemap_url` and return the report.
pub async fn index_sitemap(
    sitemap_url: &str,
    max_urls: Option<usize>,
) -> Result<SitemapReport, IndexError> {
    dotenvy::dotenv().ok();

    let mut crawler = SitemapCrawler::new(CrawlerConfig::from_env()?)?;
    if let Some(max) = max_urls {
        crawler = crawler.with_max_urls(max);
    }

    let report = crawler.crawl(sitemap_url).await?;
    tracing::info!(
        root = %report.root,
        urls = report.urls.len(),
        sitemaps = report.sitemaps_fetched,
        failed = report.failed_sitemaps,
        "Sitemap indexed"
    );
    Ok(report)
}
