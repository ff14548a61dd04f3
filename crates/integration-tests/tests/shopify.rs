//! Shopify Admin client: backoff, product cache, REST writes.

use std::time::Duration;

use contentforge_api::config::ShopifySettings;
use contentforge_api::shopify::{
    ArticleInput, ProductCache, RetryPolicy, ShopifyClient, ShopifyError,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STORE: &str = "demo.myshopify.com";

fn settings() -> ShopifySettings {
    ShopifySettings::default()
}

fn graphql_path() -> String {
    format!("/admin/api/{}/graphql.json", settings().api_version)
}

fn rest_path(resource: &str) -> String {
    format!("/admin/api/{}/{resource}", settings().api_version)
}

fn client(server: &MockServer, cache: ProductCache) -> ShopifyClient {
    client_with_token(server, cache, "shpat_test_token")
}

fn client_with_token(server: &MockServer, cache: ProductCache, token: &str) -> ShopifyClient {
    ShopifyClient::with_base_url(
        STORE,
        &server.uri(),
        &SecretString::from(token),
        &settings(),
        cache,
    )
    .expect("client")
    .with_retry_policy(RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    })
}

fn product(id: u32, title: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{id}"),
        "title": title,
        "handle": title.to_lowercase(),
        "descriptionHtml": format!("<p>{title}</p>"),
        "status": "ACTIVE",
        "vendor": "Acme",
        "productType": "Kitchen",
        "tags": [],
        "onlineStoreUrl": null,
        "featuredImage": null,
        "priceRangeV2": {"minVariantPrice": {"amount": "9.99", "currencyCode": "USD"}}
    })
}

fn products_body(nodes: Vec<Value>, next: Option<&str>) -> Value {
    json!({
        "data": {
            "products": {
                "pageInfo": {"hasNextPage": next.is_some(), "endCursor": next},
                "nodes": nodes
            }
        }
    })
}

#[tokio::test]
async fn test_http_429_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .and(header("X-Shopify-Access-Token", "shpat_test_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(products_body(vec![product(1, "Mug")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server, ProductCache::new(Duration::from_secs(60)))
        .products_page(10, None, None)
        .await
        .expect("page");

    assert_eq!(page.products.len(), 1);
    assert_eq!(page.products[0].title, "Mug");
}

#[tokio::test]
async fn test_graphql_throttled_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Throttled", "extensions": {"code": "THROTTLED"}}]
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"product": product(7, "Teapot")}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let product = client(&server, ProductCache::new(Duration::from_secs(60)))
        .product("7")
        .await
        .expect("product");

    assert_eq!(product.id, "gid://shopify/Product/7");
    assert_eq!(product.title, "Teapot");
}

#[tokio::test]
async fn test_persistent_throttling_gives_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "4"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, ProductCache::new(Duration::from_secs(60)))
        .products_page(10, None, None)
        .await
        .err();

    assert!(matches!(err, Some(ShopifyError::RateLimited(4))));
}

#[tokio::test]
async fn test_unfiltered_pages_are_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .and(body_partial_json(json!({"variables": {"query": null}})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(products_body(vec![product(1, "Mug")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .and(body_partial_json(json!({"variables": {"query": "mug"}})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(products_body(vec![product(1, "Mug")], None)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server, ProductCache::new(Duration::from_secs(60)));

    let first = client.products_page(25, None, None).await.expect("page");
    let second = client.products_page(25, None, None).await.expect("page");
    assert_eq!(first, second);

    // Searches always go to Shopify
    client.products_page(25, None, Some("mug")).await.expect("search");
    client.products_page(25, None, Some("mug")).await.expect("search");
}

#[tokio::test]
async fn test_cached_pages_are_not_shared_across_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .and(header("X-Shopify-Access-Token", "shpat_test_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(products_body(vec![product(1, "Private blend")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .and(header("X-Shopify-Access-Token", "bogus"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // Same store, same shared cache
    let cache = ProductCache::new(Duration::from_secs(60));
    let owner = client(&server, cache.clone());
    let page = owner.products_page(50, None, None).await.expect("page");
    assert_eq!(page.products[0].title, "Private blend");

    let other = client_with_token(&server, cache, "bogus");
    let err = other.products_page(50, None, None).await.err();
    assert!(matches!(err, Some(ShopifyError::Unauthorized(_))), "{err:?}");
}

#[tokio::test]
async fn test_invalidate_products_covers_every_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(products_body(vec![product(1, "Mug")], None)),
        )
        .expect(4)
        .mount(&server)
        .await;

    let cache = ProductCache::new(Duration::from_secs(60));
    let first = client(&server, cache.clone());
    let second = client_with_token(&server, cache, "shpat_second_token");
    first.products_page(25, None, None).await.expect("page");
    second.products_page(25, None, None).await.expect("page");

    first.invalidate_products();

    first.products_page(25, None, None).await.expect("page");
    second.products_page(25, None, None).await.expect("page");
}

#[tokio::test]
async fn test_invalidate_products_forces_refetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(products_body(vec![product(1, "Mug")], None)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server, ProductCache::new(Duration::from_secs(60)));
    client.products_page(25, None, None).await.expect("page");
    client.invalidate_products();
    client.products_page(25, None, None).await.expect("page");
}

#[tokio::test]
async fn test_all_products_follows_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .and(body_partial_json(json!({"variables": {"after": null}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(
            vec![product(1, "Mug"), product(2, "Cup")],
            Some("cursor-1"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .and(body_partial_json(json!({"variables": {"after": "cursor-1"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(products_body(vec![product(3, "Teapot")], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let products = client(&server, ProductCache::new(Duration::from_secs(60)))
        .all_products(5)
        .await
        .expect("products");

    let titles: Vec<&str> = products.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Mug", "Cup", "Teapot"]);
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(graphql_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"product": null}})))
        .mount(&server)
        .await;

    let err = client(&server, ProductCache::new(Duration::from_secs(60)))
        .product("gid://shopify/Product/404")
        .await
        .err();
    assert!(matches!(err, Some(ShopifyError::NotFound(_))));
}

#[tokio::test]
async fn test_update_product_description() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(rest_path("products/123.json")))
        .and(body_partial_json(json!({
            "product": {"id": 123, "body_html": "<p>New</p>"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"product": {"id": 123}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    client(&server, ProductCache::new(Duration::from_secs(60)))
        .update_product_description("gid://shopify/Product/123", "<p>New</p>")
        .await
        .expect("update");
}

#[tokio::test]
async fn test_blogs_and_articles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(rest_path("blogs.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blogs": [{"id": 11, "title": "News", "handle": "news"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(rest_path("blogs/11/articles.json")))
        .and(body_partial_json(json!({
            "article": {"title": "Brewing guide", "published": false}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "article": {"id": 99, "title": "Brewing guide", "handle": "brewing-guide", "blog_id": 11}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, ProductCache::new(Duration::from_secs(60)));
    let blogs = client.list_blogs().await.expect("blogs");
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0].handle, "news");

    let article = client
        .create_article(
            blogs[0].id,
            &ArticleInput {
                title: "Brewing guide".to_string(),
                body_html: "<p>Steep for four minutes.</p>".to_string(),
                summary_html: None,
                author: None,
                tags: String::new(),
                published: false,
            },
        )
        .await
        .expect("article");
    assert_eq!(article.id, 99);
    assert_eq!(article.handle, "brewing-guide");
}

#[tokio::test]
async fn test_rest_unknown_product_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(rest_path("products/5.json")))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"errors":"Not Found"}"#))
        .mount(&server)
        .await;

    let err = client(&server, ProductCache::new(Duration::from_secs(60)))
        .update_product_description("5", "<p>x</p>")
        .await
        .err();
    assert!(matches!(err, Some(ShopifyError::NotFound(_))));
}

#[tokio::test]
async fn test_overflowing_product_id_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {}})))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server, ProductCache::new(Duration::from_secs(60)))
        .update_product_description("gid://shopify/Product/99999999999999999999", "<p>x</p>")
        .await
        .err();
    assert!(matches!(err, Some(ShopifyError::NotFound(_))));
}
