//! Shopify Admin API client.
//!
//! - GraphQL (`graphql_client` request/response envelopes, `reqwest` 0.13
//!   for HTTP) for product reads
//! - REST for the writes that have no stable GraphQL equivalent across API
//!   versions: product `body_html`, blogs and blog articles
//! - Shopify is the source of truth for products; product pages are cached
//!   in memory via `moka` (TTL from `SHOPIFY_CACHE_TTL_SECS`)
//!
//! # Rate limits
//!
//! Product reads retry on HTTP 429 or a GraphQL `THROTTLED` error, see
//! [`RetryPolicy`].
//!
//! Clients are cheap to build per request from a website's stored
//! connection; the cache is shared through [`ProductCache`].

mod cache;
mod client;
mod queries;
pub mod types;

pub use cache::ProductCache;
pub use client::{RetryPolicy, ShopifyClient, normalize_store_domain, numeric_id};
pub use types::*;

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("shopify request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("shopify query failed: {}", GraphQLErrors(.0))]
    GraphQL(Vec<GraphQLError>),

    #[error("unexpected shopify response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("not found in store: {0}")]
    NotFound(String),

    /// Still throttled after every retry; seconds to wait.
    #[error("shopify rate limit hit, retry in {0}s")]
    RateLimited(u64),

    #[error("shopify rejected the access token: {0}")]
    Unauthorized(String),

    #[error("shopify returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid shopify connection: {0}")]
    Config(String),
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLError {
    pub message: String,
    /// `extensions.code`, e.g. `THROTTLED`.
    pub code: Option<String>,
    /// Dotted response path, e.g. `products.edges.0`.
    pub path: Option<String>,
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.message.is_empty() {
            "unknown error"
        } else {
            &self.message
        })?;
        if let Some(path) = &self.path {
            write!(f, " at {path}")?;
        }
        if let Some(code) = &self.code {
            write!(f, " [{code}]")?;
        }
        Ok(())
    }
}

struct GraphQLErrors<'a>(&'a [GraphQLError]);

impl fmt::Display for GraphQLErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no error details");
        }
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gql(message: &str, path: Option<&str>, code: Option<&str>) -> GraphQLError {
        GraphQLError {
            message: message.to_string(),
            code: code.map(String::from),
            path: path.map(String::from),
        }
    }

    #[test]
    fn test_graphql_errors_are_joined() {
        let err = ShopifyError::GraphQL(vec![
            gql("Product does not exist", Some("product"), None),
            gql("Access denied", None, Some("ACCESS_DENIED")),
        ]);
        assert_eq!(
            err.to_string(),
            "shopify query failed: Product does not exist at product; Access denied [ACCESS_DENIED]"
        );
    }

    #[test]
    fn test_graphql_errors_without_details() {
        assert_eq!(
            ShopifyError::GraphQL(vec![gql("", None, None)]).to_string(),
            "shopify query failed: unknown error"
        );
        assert_eq!(
            ShopifyError::GraphQL(vec![]).to_string(),
            "shopify query failed: no error details"
        );
    }

    #[test]
    fn test_rate_limited_message() {
        assert_eq!(
            ShopifyError::RateLimited(2).to_string(),
            "shopify rate limit hit, retry in 2s"
        );
    }
}
