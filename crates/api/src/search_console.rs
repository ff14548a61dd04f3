//! Google Search Console (Webmasters v3) client.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

const SEARCH_CONSOLE_API_URL: &str = "https://www.googleapis.com/webmasters/v3";

/// Dimensions a performance report can be grouped by.
pub const DIMENSIONS: &[&str] = &["query", "page", "country", "device", "date"];

/// Errors from the Search Console API.
#[derive(Debug, Error)]
pub enum SearchConsoleError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Access token missing, expired or lacking scope.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Google returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Response did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// A verified property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub site_url: String,
    pub permission_level: String,
}

/// Search analytics request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAnalyticsQuery {
    /// `YYYY-MM-DD`.
    pub start_date: String,
    /// `YYYY-MM-DD`.
    pub end_date: String,
    pub dimensions: Vec<String>,
    pub row_limit: u32,
}

/// One row of a search analytics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    #[serde(default)]
    pub keys: Vec<String>,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

/// Bearer-token client.
#[derive(Clone)]
pub struct SearchConsoleClient {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
}

impl SearchConsoleClient {
    /// Create a client for the public API.
    #[must_use]
    pub fn new(client: reqwest::Client, access_token: SecretString) -> Self {
        Self::with_base_url(client, access_token, SEARCH_CONSOLE_API_URL)
    }

    /// Create a client against another base URL (tests).
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, access_token: SecretString, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Properties the token can see.
    ///
    /// # Errors
    ///
    /// Returns `SearchConsoleError::Unauthorized` for a bad token.
    #[instrument(skip(self))]
    pub async fn sites(&self) -> Result<Vec<Site>, SearchConsoleError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SiteList {
            #[serde(default)]
            site_entry: Vec<Site>,
        }

        let response = self
            .client
            .get(format!("{}/sites", self.base_url))
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?;
        let list: SiteList = decode(response).await?;
        Ok(list.site_entry)
    }

    /// Run a search analytics query for `site_url`.
    ///
    /// # Errors
    ///
    /// Returns a `SearchConsoleError` if the request fails.
    #[instrument(skip(self, query))]
    pub async fn query(
        &self,
        site_url: &str,
        query: &SearchAnalyticsQuery,
    ) -> Result<Vec<PerformanceRow>, SearchConsoleError> {
        #[derive(Deserialize)]
        struct Report {
            #[serde(default)]
            rows: Vec<PerformanceRow>,
        }

        let url = format!(
            "{}/sites/{}/searchAnalytics/query",
            self.base_url,
            urlencoding::encode(site_url)
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(query)
            .send()
            .await?;
        let report: Report = decode(response).await?;
        Ok(report.rows)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SearchConsoleError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|e| SearchConsoleError::Parse(e.to_string()));
    }

    let message = serde_json::from_str::<ApiErrorResponse>(&text)
        .map_or_else(|_| text.chars().take(200).collect(), |e| e.error.message);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SearchConsoleError::Unauthorized(message));
    }
    Err(SearchConsoleError::Api {
        status: status.as_u16(),
        message,
    })
}
