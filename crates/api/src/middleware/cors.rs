//! CORS for a browser frontend on another origin.
//!
//! Session cookies need credentialed requests, so origins are listed
//! explicitly; a wildcard is not allowed together with credentials.

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// How long browsers may cache a preflight.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

/// Build the CORS layer for `origins`.
///
/// Origins that are not valid header values are skipped. Preflights allow
/// the JSON API's methods and the `Content-Type` and `Accept` headers, and
/// responses allow credentials so the session cookie is sent.
///
/// # Arguments
///
/// * `origins` - Exact origins such as `https://app.example.com`, already
///   validated by [`crate::config::ApiConfig`]
///
/// Returns `None` when no origins are configured (same-origin only).
#[must_use]
pub fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
            .max_age(PREFLIGHT_MAX_AGE),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_no_origins_no_layer() {
        assert!(cors_layer(&[]).is_none());
    }

    #[tokio::test]
    async fn test_allows_listed_origin_with_credentials() {
        let layer = cors_layer(&["https://app.acme.test".to_string()]).unwrap();
        let app = Router::new().route("/api/auth/me", get(|| async { "ok" })).layer(layer);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .header(header::ORIGIN, "https://app.acme.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.acme.test"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_ignores_other_origins() {
        let layer = cors_layer(&["https://app.acme.test".to_string()]).unwrap();
        let app = Router::new().route("/", get(|| async { "ok" })).layer(layer);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://evil.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
