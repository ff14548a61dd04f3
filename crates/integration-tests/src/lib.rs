//! Integration tests for ContentForge.
//!
//! # Running Tests
//!
//! ```bash
//! # Vendor clients against wiremock servers (no external services)
//! cargo test -p contentforge-integration-tests
//!
//! # Repositories and the end-to-end API flow (need a migrated database;
//! # the flow also needs a running server)
//! cargo test -p contentforge-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `crawler` - sitemap index walking, caps, failures
//! - `shopify` - GraphQL backoff, product cache, REST writes
//! - `ai_providers` - `OpenAI` and Gemini completions and streams
//! - `wordpress`, `search_console`, `research` - vendor clients
//! - `publishing` - post/article create-or-update, description publish and revert
//! - `repositories` - status guards and publish history against `PostgreSQL`
//! - `api_flow` - HTTP flow against a live server

use std::time::Duration;

use contentforge_api::config::CrawlerConfig;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Crawler limits suited to a local mock server.
#[must_use]
pub fn crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        max_urls: 100,
        batch_size: 2,
        max_depth: 3,
        max_sitemaps: 20,
        timeout: Duration::from_secs(5),
        user_agent: "contentforge-tests".to_string(),
    }
}

/// A `<urlset>` with one `<url>` per location.
#[must_use]
pub fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{loc}</loc><lastmod>2024-05-01</lastmod></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
    )
}

/// A `<sitemapindex>` pointing at `children`.
#[must_use]
pub fn sitemap_index(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|loc| format!("<sitemap><loc>{loc}</loc></sitemap>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</sitemapindex>"#
    )
}

/// A server-sent event stream body from `data:` payloads.
#[must_use]
pub fn sse_body(events: &[&str]) -> String {
    events.iter().map(|e| format!("data: {e}\n\n")).collect()
}
