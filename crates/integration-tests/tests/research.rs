//! Serper client against a mock API.

use contentforge_api::research::{SerperClient, SerperError};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> SerperClient {
    SerperClient::with_base_url(
        reqwest::Client::new(),
        SecretString::from("serper-test-key"),
        &server.uri(),
    )
}

#[tokio::test]
async fn test_search() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("x-api-key", "serper-test-key"))
        .and(body_json(json!({"q": "pour over coffee", "num": 10})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "searchParameters": {"q": "pour over coffee"},
            "organic": [
                {"title": "Pour Over Guide", "link": "https://a.test/guide", "snippet": "Step by step", "position": 1},
                {"title": "Best Drippers", "link": "https://b.test/drippers", "position": 2}
            ],
            "peopleAlsoAsk": [
                {"question": "Is pour over stronger?", "snippet": "..."}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server)
        .search("pour over coffee", 10)
        .await
        .expect("results");

    assert_eq!(results.organic.len(), 2);
    assert_eq!(results.organic[1].snippet, "");
    assert_eq!(results.people_also_ask, vec!["Is pour over stronger?".to_string()]);

    let prompt = results.to_prompt_text(1);
    assert!(prompt.contains("Pour Over Guide"));
    assert!(!prompt.contains("Best Drippers"));
    assert!(prompt.contains("Is pour over stronger?"));
}

#[tokio::test]
async fn test_num_is_clamped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({"q": "mugs", "num": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic": []})))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server).search("mugs", 500).await.expect("results");
    assert!(results.organic.is_empty());
    assert!(results.people_also_ask.is_empty());
}

#[tokio::test]
async fn test_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Unauthorized."))
        .mount(&server)
        .await;

    let err = client(&server).search("mugs", 10).await.err();
    assert!(matches!(err, Some(SerperError::Api { status: 403, .. })));
}
