//! Search Console client against a mock API.

use contentforge_api::search_console::{
    SearchAnalyticsQuery, SearchConsoleClient, SearchConsoleError,
};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> SearchConsoleClient {
    SearchConsoleClient::with_base_url(
        reqwest::Client::new(),
        SecretString::from("ya29.test-token"),
        &server.uri(),
    )
}

#[tokio::test]
async fn test_sites() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites"))
        .and(header("authorization", "Bearer ya29.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "siteEntry": [
                {"siteUrl": "sc-domain:acme.test", "permissionLevel": "siteOwner"},
                {"siteUrl": "https://shop.acme.test/", "permissionLevel": "siteFullUser"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sites = client(&server).sites().await.expect("sites");
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].site_url, "sc-domain:acme.test");
}

#[tokio::test]
async fn test_no_properties_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(client(&server).sites().await.expect("sites").is_empty());
}

#[tokio::test]
async fn test_query_encodes_site_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sites/https%3A%2F%2Facme.test%2F/searchAnalytics/query"))
        .and(body_partial_json(json!({
            "startDate": "2024-02-02",
            "endDate": "2024-02-29",
            "dimensions": ["query"],
            "rowLimit": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [
                {"keys": ["pour over"], "clicks": 12.0, "impressions": 340.0, "ctr": 0.035, "position": 7.2}
            ],
            "responseAggregationType": "byProperty"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client(&server)
        .query(
            "https://acme.test/",
            &SearchAnalyticsQuery {
                start_date: "2024-02-02".to_string(),
                end_date: "2024-02-29".to_string(),
                dimensions: vec!["query".to_string()],
                row_limit: 100,
            },
        )
        .await
        .expect("rows");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].keys, vec!["pour over".to_string()]);
    assert!((rows[0].clicks - 12.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_google_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Request had invalid authentication credentials."}
        })))
        .mount(&server)
        .await;

    let err = client(&server).sites().await.err();
    match err {
        Some(SearchConsoleError::Unauthorized(message)) => {
            assert!(message.contains("invalid authentication"));
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}
