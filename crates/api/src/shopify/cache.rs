//! Product page cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::types::ProductPage;

/// Maximum cached pages across all stores.
const MAX_CAPACITY: u64 = 1000;

/// TTL cache of product pages, shared by every store's client.
///
/// Keys are `products:{store}:{credential}:{first}:{after}`, where
/// `credential` is the SHA-256 of the access token: a page is only served to
/// a client holding the token that fetched it. Search results are never
/// stored, so a key fully describes an unfiltered page.
#[derive(Clone)]
pub struct ProductCache {
    inner: Cache<String, Arc<ProductPage>>,
}

impl ProductCache {
    /// Create a cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }

    /// Hex SHA-256 of an access token. Never log the token itself.
    #[must_use]
    pub fn credential(access_token: &SecretString) -> String {
        hex::encode(Sha256::digest(access_token.expose_secret().as_bytes()))
    }

    /// Cache key of an unfiltered page fetched with `credential`.
    #[must_use]
    pub fn key(store: &str, credential: &str, first: i64, after: Option<&str>) -> String {
        format!("products:{store}:{credential}:{first}:{}", after.unwrap_or(""))
    }

    pub async fn get(&self, key: &str) -> Option<Arc<ProductPage>> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, page: ProductPage) {
        self.inner.insert(key, Arc::new(page)).await;
    }

    /// Drop every cached page of `store`, whatever token fetched it.
    pub fn invalidate_store(&self, store: &str) {
        let prefix = format!("products:{store}:");
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            tracing::warn!(error = %e, "Product cache invalidation failed, clearing all");
            self.inner.invalidate_all();
        }
    }
}
