//! Shopify Admin API client implementation.

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{QueryBody, Response};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::ShopifySettings;

use super::cache::ProductCache;
use super::queries::{
    NoVariables, PRODUCT_OPERATION, PRODUCT_QUERY, PRODUCTS_OPERATION, PRODUCTS_QUERY,
    ProductData, ProductVariables, ProductsData, ProductsVariables, SHOP_OPERATION, SHOP_QUERY,
    ShopData,
};
use super::types::{Article, ArticleInput, Blog, Product, ProductPage, Shop};
use super::{GraphQLError, ShopifyError};

const MAX_PAGE_SIZE: i64 = 250;

/// Backoff schedule for throttled product reads.
///
/// Attempt `n` (0-based) waits `base_delay * 2^n`, or the server's
/// `Retry-After` when that is longer, never more than `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(attempt));
        exponential
            .max(retry_after.unwrap_or_default())
            .min(self.max_delay)
    }
}

/// Client for one store's Admin API.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

#[derive(Clone)]
struct ShopifyClientInner {
    client: reqwest::Client,
    store: String,
    credential: String,
    graphql_endpoint: String,
    rest_base: String,
    cache: ProductCache,
    retry: RetryPolicy,
}

/// Outcome of one GraphQL attempt that may be retried.
enum Attempt<D> {
    Done(D),
    Throttled(Option<Duration>),
}

/// Strip scheme, path and trailing slash from a store domain.
#[must_use]
pub fn normalize_store_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Numeric part of a GID (`gid://shopify/Product/123` -> `123`).
///
/// Plain numeric IDs are returned unchanged.
#[must_use]
pub fn numeric_id(gid: &str) -> Option<&str> {
    let tail = gid.rsplit('/').next()?;
    (!tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit())).then_some(tail)
}

impl ShopifyClient {
    /// Create a client for `https://{store}`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Config` if the token is not a valid header value.
    pub fn new(
        store: &str,
        access_token: &SecretString,
        settings: &ShopifySettings,
        cache: ProductCache,
    ) -> Result<Self, ShopifyError> {
        let store = normalize_store_domain(store);
        let base_url = format!("https://{store}");
        Self::with_base_url(&store, &base_url, access_token, settings, cache)
    }

    /// Create a client whose requests go to `base_url` instead of the store
    /// domain. Cache keys still use `store`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Config` if the token is not a valid header value.
    pub fn with_base_url(
        store: &str,
        base_url: &str,
        access_token: &SecretString,
        settings: &ShopifySettings,
        cache: ProductCache,
    ) -> Result<Self, ShopifyError> {
        if store.is_empty() {
            return Err(ShopifyError::Config("store domain is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut token = HeaderValue::from_str(access_token.expose_secret())
            .map_err(|_| ShopifyError::Config("access token is not a valid header".to_string()))?;
        token.set_sensitive(true);
        headers.insert("X-Shopify-Access-Token", token);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        let base = base_url.trim_end_matches('/');
        let rest_base = format!("{base}/admin/api/{}", settings.api_version);

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                store: store.to_string(),
                credential: ProductCache::credential(access_token),
                graphql_endpoint: format!("{rest_base}/graphql.json"),
                rest_base,
                cache,
                retry: RetryPolicy::default(),
            }),
        })
    }

    /// Replace the retry schedule.
    #[must_use]
    pub fn with_retry_policy(self, retry: RetryPolicy) -> Self {
        let inner = Arc::unwrap_or_clone(self.inner);
        Self {
            inner: Arc::new(ShopifyClientInner { retry, ..inner }),
        }
    }

    /// Store domain this client is bound to.
    #[must_use]
    pub fn store(&self) -> &str {
        &self.inner.store
    }

    // =========================================================================
    // GraphQL
    // =========================================================================

    /// Execute a GraphQL query, retrying while throttled.
    async fn execute<V, D>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<D, ShopifyError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let body = QueryBody {
            variables,
            query,
            operation_name,
        };

        let policy = self.inner.retry;
        let mut attempt = 0;
        loop {
            match self.execute_once(&body).await? {
                Attempt::Done(data) => return Ok(data),
                Attempt::Throttled(retry_after) if attempt < policy.max_retries => {
                    let delay = policy.delay(attempt, retry_after);
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Shopify throttled request, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Attempt::Throttled(retry_after) => {
                    return Err(ShopifyError::RateLimited(
                        retry_after.map_or(1, |d| d.as_secs().max(1)),
                    ));
                }
            }
        }
    }

    async fn execute_once<V, D>(&self, body: &QueryBody<V>) -> Result<Attempt<D>, ShopifyError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .post(&self.inner.graphql_endpoint)
            .json(body)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Attempt::Throttled(retry_after(response.headers())));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ShopifyError::Unauthorized(format!("HTTP {status}")));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %excerpt(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message: excerpt(&response_text, 200),
            });
        }

        let response: Response<D> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %excerpt(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            let errors: Vec<GraphQLError> = errors.into_iter().map(convert_error).collect();
            if errors.iter().any(|e| e.code.as_deref() == Some("THROTTLED")) {
                return Ok(Attempt::Throttled(None));
            }
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(errors));
        }

        response.data.map(Attempt::Done).ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "response has no data".to_string(),
                code: None,
                path: None,
            }])
        })
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch one page of products.
    ///
    /// `first` is clamped to 1..=250. Unfiltered pages (`query` is `None`)
    /// are served from and stored in the product cache under this client's
    /// token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::RateLimited` once retries are exhausted, or
    /// another `ShopifyError` if the request fails.
    #[instrument(skip(self), fields(store = %self.inner.store))]
    pub async fn products_page(
        &self,
        first: i64,
        after: Option<&str>,
        query: Option<&str>,
    ) -> Result<ProductPage, ShopifyError> {
        let first = first.clamp(1, MAX_PAGE_SIZE);
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let cache_key = query.is_none().then(|| {
            ProductCache::key(&self.inner.store, &self.inner.credential, first, after)
        });

        if let Some(key) = &cache_key
            && let Some(page) = self.inner.cache.get(key).await
        {
            debug!("Cache hit for products");
            return Ok((*page).clone());
        }

        let data: ProductsData = self
            .execute(
                PRODUCTS_OPERATION,
                PRODUCTS_QUERY,
                ProductsVariables {
                    first,
                    after,
                    query,
                },
            )
            .await?;
        let page = ProductPage::from(data.products);

        if let Some(key) = cache_key {
            self.inner.cache.insert(key, page.clone()).await;
        }

        Ok(page)
    }

    /// Follow `end_cursor` until the last page or `max_pages` pages.
    ///
    /// # Errors
    ///
    /// Returns the first page error.
    #[instrument(skip(self), fields(store = %self.inner.store))]
    pub async fn all_products(&self, max_pages: usize) -> Result<Vec<Product>, ShopifyError> {
        let mut products = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..max_pages {
            let page = self
                .products_page(MAX_PAGE_SIZE, cursor.as_deref(), None)
                .await?;
            products.extend(page.products);
            match page.end_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        Ok(products)
    }

    /// Fetch one product by GID (or numeric ID).
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(store = %self.inner.store))]
    pub async fn product(&self, id: &str) -> Result<Product, ShopifyError> {
        let gid = if id.starts_with("gid://") {
            id.to_string()
        } else {
            format!("gid://shopify/Product/{id}")
        };

        let data: ProductData = self
            .execute(
                PRODUCT_OPERATION,
                PRODUCT_QUERY,
                ProductVariables { id: &gid },
            )
            .await?;

        data.product
            .map(Product::from)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {id}")))
    }

    /// Shop identity. Used to verify credentials.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Unauthorized` for a bad token.
    #[instrument(skip(self), fields(store = %self.inner.store))]
    pub async fn shop(&self) -> Result<Shop, ShopifyError> {
        let data: ShopData = self.execute(SHOP_OPERATION, SHOP_QUERY, NoVariables {}).await?;
        Ok(Shop::from(data.shop))
    }

    /// Drop this store's cached product pages.
    pub fn invalidate_products(&self) {
        self.inner.cache.invalidate_store(&self.inner.store);
    }

    // =========================================================================
    // REST
    // =========================================================================

    /// Replace a product's description.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` for an unknown product.
    #[instrument(skip(self, body_html), fields(store = %self.inner.store))]
    pub async fn update_product_description(
        &self,
        product_id: &str,
        body_html: &str,
    ) -> Result<(), ShopifyError> {
        let numeric = numeric_id(product_id)
            .ok_or_else(|| ShopifyError::NotFound(format!("Invalid product id: {product_id}")))?;

        let id: i64 = numeric
            .parse()
            .map_err(|_| ShopifyError::NotFound(format!("Invalid product id: {product_id}")))?;

        let payload = serde_json::json!({
            "product": { "id": id, "body_html": body_html }
        });
        let url = format!("{}/products/{numeric}.json", self.inner.rest_base);
        let response = self.inner.client.put(url).json(&payload).send().await?;
        let _: serde_json::Value = rest_body(response).await?;
        Ok(())
    }

    /// List the store's blogs.
    ///
    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    #[instrument(skip(self), fields(store = %self.inner.store))]
    pub async fn list_blogs(&self) -> Result<Vec<Blog>, ShopifyError> {
        #[derive(serde::Deserialize)]
        struct Blogs {
            blogs: Vec<Blog>,
        }

        let url = format!("{}/blogs.json", self.inner.rest_base);
        let response = self.inner.client.get(url).send().await?;
        let blogs: Blogs = rest_body(response).await?;
        Ok(blogs.blogs)
    }

    /// Create an article in a blog.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` for an unknown blog.
    #[instrument(skip(self, article), fields(store = %self.inner.store))]
    pub async fn create_article(
        &self,
        blog_id: i64,
        article: &ArticleInput,
    ) -> Result<Article, ShopifyError> {
        #[derive(Serialize)]
        struct Payload<'a> {
            article: &'a ArticleInput,
        }
        #[derive(serde::Deserialize)]
        struct Created {
            article: Article,
        }

        let url = format!("{}/blogs/{blog_id}/articles.json", self.inner.rest_base);
        let response = self
            .inner
            .client
            .post(url)
            .json(&Payload { article })
            .send()
            .await?;
        let created: Created = rest_body(response).await?;
        Ok(created.article)
    }

    /// Replace an existing article.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the blog or article is gone.
    #[instrument(skip(self, article), fields(store = %self.inner.store))]
    pub async fn update_article(
        &self,
        blog_id: i64,
        article_id: i64,
        article: &ArticleInput,
    ) -> Result<Article, ShopifyError> {
        #[derive(Serialize)]
        struct Payload<'a> {
            article: &'a ArticleInput,
        }
        #[derive(serde::Deserialize)]
        struct Updated {
            article: Article,
        }

        let url = format!(
            "{}/blogs/{blog_id}/articles/{article_id}.json",
            self.inner.rest_base
        );
        let response = self
            .inner
            .client
            .put(url)
            .json(&Payload { article })
            .send()
            .await?;
        let updated: Updated = rest_body(response).await?;
        Ok(updated.article)
    }
}

fn convert_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        code: e
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(|c| c.as_str())
            .map(str::to_string),
        message: e.message,
        path: e.path.map(|fragments| {
            fragments
                .iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(key) => key.clone(),
                    graphql_client::PathFragment::Index(i) => i.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        }),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

fn excerpt(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Decode a REST response, mapping error statuses.
async fn rest_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ShopifyError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let secs = retry_after(response.headers()).map_or(1, |d| d.as_secs().max(1));
        return Err(ShopifyError::RateLimited(secs));
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ShopifyError::Unauthorized(format!("HTTP {status}")));
    }

    let text = response.text().await?;
    if status == StatusCode::NOT_FOUND {
        return Err(ShopifyError::NotFound(excerpt(&text, 200)));
    }
    if !status.is_success() {
        return Err(ShopifyError::Api {
            status: status.as_u16(),
            message: excerpt(&text, 200),
        });
    }
    Ok(serde_json::from_str(&text)?)
}
