//! Website profiles.
//!
//! A website is the unit everything else hangs off: its sitemap index,
//! business analysis, generated contents, platform connections and product
//! descriptions all reference it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use contentforge_core::{UserId, WebsiteId};

use crate::crawler::SitemapUrl;

/// A website profile owned by a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Website {
    pub id: WebsiteId,
    pub user_id: UserId,
    pub name: String,
    /// Normalised origin (`https://example.com`), no trailing slash.
    pub url: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub tone: Option<String>,
    /// Content language (BCP 47 tag, default `en`).
    pub language: String,
    /// Explicit sitemap location, if the user set one.
    pub sitemap_url: Option<String>,
    /// Page URLs collected by the last sitemap index run.
    #[serde(skip)]
    pub sitemap_urls: Json<Vec<SitemapUrl>>,
    pub indexed_at: Option<DateTime<Utc>>,
    pub analysis: Option<Json<BusinessAnalysis>>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Website {
    /// Number of indexed page URLs.
    #[must_use]
    pub fn indexed_url_count(&self) -> usize {
        self.sitemap_urls.0.len()
    }

    /// The stored business analysis, if the site was analyzed.
    #[must_use]
    pub fn business_analysis(&self) -> Option<&BusinessAnalysis> {
        self.analysis.as_ref().map(|a| &a.0)
    }
}

/// Structured summary of a business produced by the language model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessAnalysis {
    pub summary: String,
    #[serde(default)]
    pub products_services: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub unique_selling_points: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Fields accepted when creating a website.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWebsite {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub tone: Option<String>,
    pub language: Option<String>,
    pub sitemap_url: Option<String>,
}

/// Partial update of a website. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebsiteUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub target_audience: Option<String>,
    pub tone: Option<String>,
    pub language: Option<String>,
    pub sitemap_url: Option<String>,
}

/// Normalise a user-supplied site URL to its origin.
///
/// Accepts bare domains (`example.com`) by assuming `https`.
///
/// # Errors
///
/// Returns a message when the URL cannot be parsed or is not http(s).
pub fn normalize_site_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("url is required".to_string());
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = url::Url::parse(&candidate).map_err(|e| format!("invalid url: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err("url must use http or https".to_string());
    }
    if parsed.host_str().is_none() {
        return Err("url must have a host".to_string());
    }

    Ok(parsed.origin().ascii_serialization())
}
