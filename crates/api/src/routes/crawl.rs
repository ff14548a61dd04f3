//! Sitemap indexing.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use contentforge_core::WebsiteId;

use crate::crawler::{SitemapReport, SitemapUrl};
use crate::db::WebsiteRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::routes::websites::owned_website;
use crate::state::AppState;

/// Body of an index run. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct IndexSitemapRequest {
    /// Sitemap to start from instead of the website's or the discovered one.
    pub sitemap_url: Option<String>,
    /// Lower URL cap for this run (the configured cap still applies).
    pub max_urls: Option<usize>,
}

/// Stored sitemap URL list.
#[derive(Debug, Serialize)]
pub struct SitemapResponse {
    pub website_id: WebsiteId,
    pub indexed_at: Option<DateTime<Utc>>,
    pub count: usize,
    pub urls: Vec<SitemapUrl>,
}

/// Crawl the website's sitemap and store the page URLs.
///
/// POST /api/websites/{id}/index-sitemap
///
/// # Errors
///
/// 400 for an invalid sitemap URL, 404 if not the caller's website,
/// 502 if the root sitemap cannot be fetched or parsed.
pub async fn index_sitemap(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WebsiteId>,
    body: Option<Json<IndexSitemapRequest>>,
) -> Result<Json<SitemapReport>, AppError> {
    let website = owned_website(&state, user.id, id).await?;
    let Json(body) = body.unwrap_or_default();

    let mut crawler = state.crawler().clone();
    if let Some(max_urls) = body.max_urls {
        let cap = crawler.config().max_urls;
        crawler = crawler.with_max_urls(max_urls.min(cap));
    }

    let root = crawler
        .discover(
            &website.url,
            body.sitemap_url.as_deref(),
            website.sitemap_url.as_deref(),
        )
        .await?;
    let report = crawler.crawl(&root).await?;

    WebsiteRepository::new(state.pool())
        .save_sitemap(website.id, &report.urls)
        .await?;

    info!(
        website_id = %website.id,
        root = %report.root,
        urls = report.urls.len(),
        sitemaps_fetched = report.sitemaps_fetched,
        failed_sitemaps = report.failed_sitemaps,
        truncated = report.truncated,
        "Sitemap indexed"
    );
    Ok(Json(report))
}

/// Page URLs from the last index run.
///
/// GET /api/websites/{id}/sitemap
///
/// # Errors
///
/// 404 if not the caller's website.
pub async fn sitemap(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WebsiteId>,
) -> Result<Json<SitemapResponse>, AppError> {
    let website = owned_website(&state, user.id, id).await?;
    let urls = website.sitemap_urls.0;
    Ok(Json(SitemapResponse {
        website_id: website.id,
        indexed_at: website.indexed_at,
        count: urls.len(),
        urls,
    }))
}
