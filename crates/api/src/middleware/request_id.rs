//! Request ID middleware for request tracing and correlation.
//!
//! Uses the incoming `x-request-id` header when a proxy set one, otherwise a
//! fresh UUID v4. The ID is recorded in the tracing span, tagged on the
//! Sentry scope and echoed in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted before a fresh one is generated.
const MAX_UPSTREAM_LEN: usize = 128;

/// Middleware that ensures every request has a unique request ID.
///
/// Must run inside the `TraceLayer` so the `request_id` field of the
/// `http_request` span exists when it is recorded.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= MAX_UPSTREAM_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
