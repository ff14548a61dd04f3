//! Publishing writes against mock WordPress and Shopify servers.

use std::time::Duration;

use chrono::Utc;
use contentforge_api::config::ShopifySettings;
use contentforge_api::models::Content;
use contentforge_api::services::publishing::{
    publish_product_description, publish_shopify, publish_wordpress, restore_product_description,
};
use contentforge_api::shopify::{ProductCache, ShopifyClient};
use contentforge_api::wordpress::WordPressClient;
use contentforge_core::{ContentId, ContentKind, ContentStatus, Platform, WebsiteId};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT: &str = "gid://shopify/Product/123";

fn content() -> Content {
    Content {
        id: ContentId::new(1),
        website_id: WebsiteId::new(1),
        kind: ContentKind::Article,
        title: "Brewing guide".to_string(),
        keywords: vec!["pour over".to_string(), "coffee".to_string()],
        body_markdown: "Steep for four minutes.".to_string(),
        body_html: "<p>Steep for four minutes.</p>".to_string(),
        meta_title: None,
        meta_description: Some("How we brew".to_string()),
        status: ContentStatus::Draft,
        platform: None,
        external_id: None,
        external_url: None,
        published_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// `content` as it looks after a publish landed at `external_id`.
fn published_to(platform: Platform, external_id: &str) -> Content {
    Content {
        status: ContentStatus::Published,
        platform: Some(platform),
        external_id: Some(external_id.to_string()),
        published_at: Some(Utc::now()),
        ..content()
    }
}

fn wordpress(server: &MockServer) -> WordPressClient {
    WordPressClient::new(
        &server.uri(),
        "editor",
        &SecretString::from("abcd efgh 1234 5678"),
    )
    .expect("client")
}

fn shopify(server: &MockServer) -> ShopifyClient {
    ShopifyClient::with_base_url(
        "demo.myshopify.com",
        &server.uri(),
        &SecretString::from("shpat_test_token"),
        &ShopifySettings::default(),
        ProductCache::new(Duration::from_secs(60)),
    )
    .expect("client")
}

fn rest_path(resource: &str) -> String {
    format!(
        "/admin/api/{}/{resource}",
        ShopifySettings::default().api_version
    )
}

fn product_body(description_html: &str) -> Value {
    json!({
        "data": {
            "product": {
                "id": PRODUCT,
                "title": "Mug",
                "handle": "mug",
                "descriptionHtml": description_html,
                "status": "ACTIVE",
                "vendor": "Acme",
                "productType": "Kitchen",
                "tags": [],
                "onlineStoreUrl": null,
                "featuredImage": null,
                "priceRangeV2": {"minVariantPrice": {"amount": "9.99", "currencyCode": "USD"}}
            }
        }
    })
}

fn products_body() -> Value {
    json!({
        "data": {
            "products": {
                "pageInfo": {"hasNextPage": false, "endCursor": null},
                "nodes": []
            }
        }
    })
}

async fn mount_blogs(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(rest_path("blogs.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blogs": [
                {"id": 11, "title": "News", "handle": "news"},
                {"id": 12, "title": "Guides", "handle": "guides"}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_wordpress_creates_then_updates_same_post() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(body_partial_json(json!({"title": "Brewing guide", "status": "publish"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 41, "link": "https://blog.test/brewing-guide/", "status": "publish"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts/41"))
        .and(body_partial_json(json!({"status": "draft"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 41, "link": "https://blog.test/?p=41", "status": "draft"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = wordpress(&server);
    let created = publish_wordpress(&client, &content(), "publish".to_string(), vec![])
        .await
        .expect("create");
    assert_eq!(created.platform, Platform::WordPress);
    assert_eq!(created.external_id, "41");

    let republished = published_to(Platform::WordPress, &created.external_id);
    let updated = publish_wordpress(&client, &republished, "draft".to_string(), vec![])
        .await
        .expect("update");
    assert_eq!(updated.external_id, "41");
    assert_eq!(updated.external_url.as_deref(), Some("https://blog.test/?p=41"));
}

#[tokio::test]
async fn test_wordpress_ignores_id_from_another_platform() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 42, "link": "https://blog.test/?p=42", "status": "publish"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Last published to Shopify as article 99 of blog 11
    let elsewhere = published_to(Platform::Shopify, "11/99");
    let target = publish_wordpress(&wordpress(&server), &elsewhere, "publish".to_string(), vec![])
        .await
        .expect("create");
    assert_eq!(target.external_id, "42");
}

#[tokio::test]
async fn test_shopify_creates_then_updates_same_article() {
    let server = MockServer::start().await;
    mount_blogs(&server).await;

    Mock::given(method("POST"))
        .and(path(rest_path("blogs/12/articles.json")))
        .and(body_partial_json(json!({
            "article": {"title": "Brewing guide", "tags": "pour over, coffee", "published": true}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "article": {"id": 99, "title": "Brewing guide", "handle": "brewing-guide", "blog_id": 12}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(rest_path("blogs/12/articles/99.json")))
        .and(body_partial_json(json!({"article": {"published": false}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "article": {"id": 99, "title": "Brewing guide", "handle": "brewing-guide", "blog_id": 12}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = shopify(&server);
    let created = publish_shopify(&client, &content(), false, Some(12))
        .await
        .expect("create");
    assert_eq!(created.external_id, "12/99");
    assert_eq!(
        created.external_url.as_deref(),
        Some("https://demo.myshopify.com/blogs/guides/brewing-guide")
    );

    // No blog given: stays in the article's blog
    let republished = published_to(Platform::Shopify, &created.external_id);
    let updated = publish_shopify(&client, &republished, true, None)
        .await
        .expect("update");
    assert_eq!(updated.external_id, "12/99");
}

#[tokio::test]
async fn test_shopify_other_blog_gets_a_new_article() {
    let server = MockServer::start().await;
    mount_blogs(&server).await;

    Mock::given(method("POST"))
        .and(path(rest_path("blogs/11/articles.json")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "article": {"id": 100, "title": "Brewing guide", "handle": "brewing-guide", "blog_id": 11}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let republished = published_to(Platform::Shopify, "12/99");
    let target = publish_shopify(&shopify(&server), &republished, false, Some(11))
        .await
        .expect("create");
    assert_eq!(target.external_id, "11/100");
}

#[tokio::test]
async fn test_revert_restores_the_description_each_publish_replaced() {
    let server = MockServer::start().await;

    // Live description before A, then A once it is published
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"operationName": "Product"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_body("<p>Original</p>")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"operationName": "Product"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_body("<p>A</p>")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(rest_path("products/123.json")))
        .and(body_partial_json(json!({"product": {"id": 123, "body_html": "<p>A</p>"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {"id": 123}})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(rest_path("products/123.json")))
        .and(body_partial_json(json!({"product": {"body_html": "<p>B</p>"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {"id": 123}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = shopify(&server);
    let before_a = publish_product_description(&client, PRODUCT, "<p>A</p>")
        .await
        .expect("publish A");
    assert_eq!(before_a, "<p>Original</p>");

    let before_b = publish_product_description(&client, PRODUCT, "<p>B</p>")
        .await
        .expect("publish B");
    assert_eq!(before_b, "<p>A</p>");

    // Reverting B puts A back, not the text seen at generation time
    restore_product_description(&client, PRODUCT, &before_b)
        .await
        .expect("revert B");
}

#[tokio::test]
async fn test_publish_and_revert_invalidate_cached_pages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"operationName": "Products"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body()))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"operationName": "Product"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_body("<p>Original</p>")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(rest_path("products/123.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {"id": 123}})))
        .expect(2)
        .mount(&server)
        .await;

    let client = shopify(&server);
    client.products_page(50, None, None).await.expect("page");
    client.products_page(50, None, None).await.expect("cached");

    let previous = publish_product_description(&client, PRODUCT, "<p>New</p>")
        .await
        .expect("publish");
    client.products_page(50, None, None).await.expect("refetched");

    restore_product_description(&client, PRODUCT, &previous)
        .await
        .expect("revert");
    client.products_page(50, None, None).await.expect("refetched");
}

#[tokio::test]
async fn test_failed_read_skips_the_write() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"operationName": "Product"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"product": null}})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = publish_product_description(&shopify(&server), PRODUCT, "<p>New</p>").await;
    assert!(result.is_err());
}
