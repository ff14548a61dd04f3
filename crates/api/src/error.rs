//! Unified error handling for the API.
//!
//! Every handler returns `Result<_, AppError>`; the error renders as
//! `{"error": "<message>"}` with a status derived from its source.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::ai::AiError;
use crate::crawler::CrawlError;
use crate::db::RepositoryError;
use crate::research::SerperError;
use crate::search_console::SearchConsoleError;
use crate::services::auth::AuthError;
use crate::shopify::ShopifyError;
use crate::wordpress::WordPressError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Registration or login failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Language model call failed.
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Sitemap or page fetch failed.
    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// WordPress API operation failed.
    #[error("WordPress error: {0}")]
    WordPress(#[from] WordPressError),

    /// Search Console API operation failed.
    #[error("Search Console error: {0}")]
    SearchConsole(#[from] SearchConsoleError),

    /// Serper API operation failed.
    #[error("Research error: {0}")]
    Research(#[from] SerperError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// State conflict (duplicate, illegal status change).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(e) => match e {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(e) => match e {
                AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Ai(e) => match e {
                AiError::NotConfigured(_) => StatusCode::BAD_REQUEST,
                AiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Crawl(CrawlError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            Self::Shopify(e) => match e {
                ShopifyError::NotFound(_) => StatusCode::NOT_FOUND,
                ShopifyError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                ShopifyError::Config(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::WordPress(WordPressError::Config(_)) => StatusCode::BAD_REQUEST,
            Self::Crawl(_) | Self::WordPress(_) | Self::SearchConsole(_) | Self::Research(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(what)) => what.clone(),
            Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash) => {
                "Internal server error".to_string()
            }
            Self::Auth(e) => e.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(msg) | Self::BadRequest(msg) | Self::Conflict(msg) => msg.clone(),
            _ if self.status() == StatusCode::INTERNAL_SERVER_ERROR => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server and upstream failures go to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                status = status.as_u16(),
                sentry_event_id = %event_id,
                "API request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let mut response = (status, Json(json!({ "error": self.public_message() }))).into_response();

        let retry_after = match &self {
            Self::Ai(AiError::RateLimited(secs)) | Self::Shopify(ShopifyError::RateLimited(secs)) => {
                Some(*secs)
            }
            _ => None,
        };
        if let Some(secs) = retry_after
            && let Ok(value) = axum::http::HeaderValue::from_str(&secs.to_string())
        {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, value);
        }

        response
    }
}

/// Set the Sentry user context from a user ID.
pub fn set_sentry_user(user_id: i32, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("website".to_string());
        assert_eq!(err.to_string(), "Not found: website");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_source_errors_map_to_statuses() {
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("x".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AiError::NotConfigured("gemini".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AiError::EmptyResponse.into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(ShopifyError::RateLimited(4).into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(CrawlError::InvalidUrl("x".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CrawlError::NotASitemap("html".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let body = body_json(AppError::BadRequest("name is required".to_string())).await;
        assert_eq!(body, json!({"error": "name is required"}));

        let body = body_json(RepositoryError::DataCorruption("bad row".to_string()).into()).await;
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::Ai(AiError::RateLimited(30)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(axum::http::header::RETRY_AFTER).unwrap(),
            "30"
        );
    }
}
