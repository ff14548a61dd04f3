//! `OpenAI` chat completions client.

use std::sync::Arc;

use async_trait::async_trait;
use contentforge_core::AiProvider;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::ProviderConfig;

use super::error::error_from_response;
use super::sse::{SseData, TextStream, text_stream};
use super::{AiError, Completion, CompletionRequest, LanguageModel};

const OPENAI_API_URL: &str = "https://api.openai.com";

/// `OpenAI` chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    inner: Arc<OpenAiClientInner>,
}

struct OpenAiClientInner {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client for `api.openai.com`.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Unauthorized` if the key is not a valid header value.
    pub fn new(config: &ProviderConfig) -> Result<Self, AiError> {
        Self::with_base_url(config, OPENAI_API_URL)
    }

    /// Create a client against another base URL (proxies, tests).
    ///
    /// # Errors
    ///
    /// Returns `AiError::Unauthorized` if the key is not a valid header value.
    pub fn with_base_url(config: &ProviderConfig, base_url: &str) -> Result<Self, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|_| AiError::Unauthorized("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(OpenAiClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                model: config.model.clone(),
            }),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.inner.base_url)
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest, stream: bool) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &self.inner.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json.then_some(ResponseFormat {
                format_type: "json_object",
            }),
            stream,
        }
    }
}

/// Interpret one streamed chunk.
fn decode_chunk(data: &str) -> Result<SseData, AiError> {
    if data.trim() == "[DONE]" {
        return Ok(SseData::Done);
    }
    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|e| AiError::Parse(format!("Failed to parse stream chunk: {e}")))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty())
        .map_or(SseData::Skip, SseData::Text))
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn provider(&self) -> AiProvider {
        AiProvider::Openai
    }

    fn model(&self) -> &str {
        &self.inner.model
    }

    #[instrument(skip(self, request), fields(model = %self.inner.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint())
            .json(&self.build_request(request, false))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Failed to parse response: {e}")))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(AiError::EmptyResponse)?;

        Ok(Completion {
            text,
            provider: AiProvider::Openai,
            model: self.inner.model.clone(),
        })
    }

    #[instrument(skip(self, request), fields(model = %self.inner.model))]
    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, AiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint())
            .json(&self.build_request(request, true))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(text_stream(response, decode_chunk))
    }
}
