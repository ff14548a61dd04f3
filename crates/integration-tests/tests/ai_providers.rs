//! `OpenAI` and Gemini clients against mock endpoints.

use std::sync::Arc;

use contentforge_api::ai::{
    AiClients, AiError, CompletionRequest, GeminiClient, LanguageModel, OpenAiClient,
    parse_json_output,
};
use contentforge_api::config::ProviderConfig;
use contentforge_core::AiProvider;
use contentforge_integration_tests::sse_body;
use futures::StreamExt;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_MODEL: &str = "gemini-1.5-flash";

fn openai(server: &MockServer) -> OpenAiClient {
    OpenAiClient::with_base_url(
        &ProviderConfig {
            api_key: SecretString::from("sk-test-key"),
            model: "gpt-4o-mini".to_string(),
        },
        &server.uri(),
    )
    .expect("client")
}

fn gemini(server: &MockServer) -> GeminiClient {
    GeminiClient::with_base_url(
        &ProviderConfig {
            api_key: SecretString::from("g-test-key"),
            model: GEMINI_MODEL.to_string(),
        },
        &server.uri(),
    )
    .expect("client")
}

fn event_stream(events: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(sse_body(events))
}

async fn collect(model: &dyn LanguageModel, request: &CompletionRequest) -> Vec<String> {
    let mut stream = model.stream(request).await.expect("stream");
    let mut out = Vec::new();
    while let Some(delta) = stream.next().await {
        out.push(delta.expect("delta"));
    }
    out
}

#[tokio::test]
async fn test_openai_complete_json_mode() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "```json\n{\"topics\": [\"Brewing\"]}\n```"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = openai(&server)
        .complete(&CompletionRequest::new("system", "topics please").json())
        .await
        .expect("completion");

    assert_eq!(completion.provider, AiProvider::Openai);
    let parsed: serde_json::Value = parse_json_output(&completion.text).expect("json");
    assert_eq!(parsed["topics"][0], "Brewing");
}

#[tokio::test]
async fn test_openai_stream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(event_stream(&[
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
            r##"{"choices":[{"delta":{"content":"# Title"}}]}"##,
            r#"{"choices":[{"delta":{"content":"\n\nBody"}}]}"#,
            "[DONE]",
        ]))
        .mount(&server)
        .await;

    let deltas = collect(&openai(&server), &CompletionRequest::new("s", "write")).await;
    assert_eq!(deltas, vec!["# Title".to_string(), "\n\nBody".to_string()]);
}

#[tokio::test]
async fn test_openai_rate_limit_and_auth_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;

    let client = openai(&server);
    let request = CompletionRequest::new("s", "p");

    let err = client.complete(&request).await.err();
    assert!(matches!(err, Some(AiError::RateLimited(12))));

    let err = client.stream(&request).await.err();
    assert!(matches!(err, Some(AiError::Unauthorized(_))));
}

#[tokio::test]
async fn test_openai_api_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "max_tokens is too large"}
        })))
        .mount(&server)
        .await;

    let err = openai(&server)
        .complete(&CompletionRequest::new("s", "p"))
        .await
        .err();
    match err {
        Some(AiError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "max_tokens is too large");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_gemini_complete() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{GEMINI_MODEL}:generateContent")))
        .and(query_param("key", "g-test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "system"}]},
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"summary\":"}, {"text": " \"Mugs\"}"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = gemini(&server)
        .complete(&CompletionRequest::new("system", "analyze").json())
        .await
        .expect("completion");

    assert_eq!(completion.provider, AiProvider::Gemini);
    assert_eq!(completion.text, "{\"summary\": \"Mugs\"}");
}

#[tokio::test]
async fn test_gemini_empty_candidates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{GEMINI_MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = gemini(&server)
        .complete(&CompletionRequest::new("s", "p"))
        .await
        .err();
    assert!(matches!(err, Some(AiError::EmptyResponse)));
}

#[tokio::test]
async fn test_gemini_stream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{GEMINI_MODEL}:streamGenerateContent")))
        .and(query_param("alt", "sse"))
        .and(query_param("key", "g-test-key"))
        .respond_with(event_stream(&[
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":", world"}]}}]}"#,
        ]))
        .mount(&server)
        .await;

    let deltas = collect(&gemini(&server), &CompletionRequest::new("s", "greet")).await;
    assert_eq!(deltas.concat(), "Hello, world");
}

#[tokio::test]
async fn test_ai_clients_routes_by_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{GEMINI_MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "from gemini"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clients = AiClients::new(None, Some(Arc::new(gemini(&server))), AiProvider::Gemini);

    let model = clients.get(None).expect("default provider");
    let completion = model
        .complete(&CompletionRequest::new("s", "p"))
        .await
        .expect("completion");
    assert_eq!(completion.text, "from gemini");

    assert!(matches!(
        clients.get(Some(AiProvider::Openai)).err(),
        Some(AiError::NotConfigured(_))
    ));
}
