//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::ai::{AiClients, AiError};
use crate::config::ApiConfig;
use crate::crawler::{CrawlError, SitemapCrawler};
use crate::research::SerperClient;
use crate::shopify::ProductCache;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("language model setup failed: {0}")]
    Ai(#[from] AiError),
    #[error("crawler setup failed: {0}")]
    Crawler(#[from] CrawlError),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    ai: AiClients,
    http: reqwest::Client,
    crawler: SitemapCrawler,
    product_cache: ProductCache,
    serper: Option<SerperClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if a client cannot be constructed.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let ai = AiClients::from_config(&config.ai)?;
        Self::with_ai(config, pool, ai)
    }

    /// Create state with explicit language model clients.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if a client cannot be constructed.
    pub fn with_ai(config: ApiConfig, pool: PgPool, ai: AiClients) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let crawler = SitemapCrawler::new(config.crawler.clone())?;
        let product_cache = ProductCache::new(config.shopify.cache_ttl);
        let serper = config
            .serper
            .as_ref()
            .map(|s| SerperClient::new(http.clone(), s.api_key.clone()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                ai,
                http,
                crawler,
                product_cache,
                serper,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Configured language model providers.
    #[must_use]
    pub fn ai(&self) -> &AiClients {
        &self.inner.ai
    }

    /// Shared outbound HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    #[must_use]
    pub fn crawler(&self) -> &SitemapCrawler {
        &self.inner.crawler
    }

    /// Product page cache shared by every store's client.
    #[must_use]
    pub fn product_cache(&self) -> &ProductCache {
        &self.inner.product_cache
    }

    /// Serper client, if `SERPER_API_KEY` is set.
    #[must_use]
    pub fn serper(&self) -> Option<&SerperClient> {
        self.inner.serper.as_ref()
    }
}
