//! WordPress REST API client (`/wp-json/wp/v2`).
//!
//! Authenticates with an application password over HTTP Basic auth.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Errors from the WordPress REST API.
#[derive(Debug, Error)]
pub enum WordPressError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// WordPress returned `{code, message}`.
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// WordPress error code, e.g. `rest_post_invalid_id`.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// Response did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Site URL or credentials unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    message: String,
}

/// The authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpUser {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// A post category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub count: i64,
}

/// Fields for creating or updating a post.
#[derive(Debug, Clone, Serialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    /// `draft`, `publish`, `pending` or `private`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<i64>,
}

/// A post as returned by WordPress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub link: String,
    pub status: String,
}

/// Client bound to one site and user.
#[derive(Clone)]
pub struct WordPressClient {
    inner: Arc<WordPressClientInner>,
}

struct WordPressClientInner {
    client: reqwest::Client,
    api_base: String,
}

impl WordPressClient {
    /// Create a client for `site_url`.
    ///
    /// # Errors
    ///
    /// Returns `WordPressError::Config` if the URL is not http(s).
    pub fn new(
        site_url: &str,
        username: &str,
        app_password: &SecretString,
    ) -> Result<Self, WordPressError> {
        let site = url::Url::parse(site_url.trim())
            .map_err(|e| WordPressError::Config(format!("invalid site url: {e}")))?;
        if !matches!(site.scheme(), "http" | "https") {
            return Err(WordPressError::Config(
                "site url must use http or https".to_string(),
            ));
        }

        // Application passwords are shown with spaces; WordPress ignores them.
        let password: String = app_password
            .expose_secret()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let credentials = BASE64.encode(format!("{username}:{password}"));
        let mut auth = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|_| WordPressError::Config("credentials are not a valid header".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(WordPressClientInner {
                client,
                api_base: format!("{}/wp-json/wp/v2", site.as_str().trim_end_matches('/')),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.api_base)
    }

    /// The user the credentials belong to.
    ///
    /// # Errors
    ///
    /// Returns `WordPressError::Unauthorized` for bad credentials.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<WpUser, WordPressError> {
        let response = self.inner.client.get(self.url("users/me")).send().await?;
        decode(response).await
    }

    /// Up to 100 categories.
    ///
    /// # Errors
    ///
    /// Returns a `WordPressError` if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, WordPressError> {
        let response = self
            .inner
            .client
            .get(self.url("categories?per_page=100"))
            .send()
            .await?;
        decode(response).await
    }

    /// Create a post.
    ///
    /// # Errors
    ///
    /// Returns a `WordPressError` if the request fails.
    #[instrument(skip(self, post), fields(title = %post.title))]
    pub async fn create_post(&self, post: &PostInput) -> Result<Post, WordPressError> {
        let response = self
            .inner
            .client
            .post(self.url("posts"))
            .json(post)
            .send()
            .await?;
        decode(response).await
    }

    /// Update an existing post.
    ///
    /// # Errors
    ///
    /// Returns `WordPressError::Api` with `rest_post_invalid_id` if the post
    /// is gone.
    #[instrument(skip(self, post))]
    pub async fn update_post(&self, id: i64, post: &PostInput) -> Result<Post, WordPressError> {
        let response = self
            .inner
            .client
            .post(self.url(&format!("posts/{id}")))
            .json(post)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, WordPressError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|e| WordPressError::Parse(e.to_string()));
    }

    let body = serde_json::from_str::<ApiErrorBody>(&text).ok();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(WordPressError::Unauthorized(
            body.map_or_else(|| format!("HTTP {status}"), |b| b.message),
        ));
    }

    Err(match body {
        Some(b) => WordPressError::Api {
            status: status.as_u16(),
            code: b.code,
            message: b.message,
        },
        None => WordPressError::Api {
            status: status.as_u16(),
            code: "http_error".to_string(),
            message: text.chars().take(200).collect(),
        },
    })
}
