//! Google Gemini (Generative Language API) client.

use std::sync::Arc;

use async_trait::async_trait;
use contentforge_core::AiProvider;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::ProviderConfig;

use super::error::error_from_response;
use super::sse::{SseData, TextStream, text_stream};
use super::{AiError, Completion, CompletionRequest, LanguageModel};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of all parts of the first candidate.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    /// Create a client for `generativelanguage.googleapis.com`.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, AiError> {
        Self::with_base_url(config, GEMINI_API_URL)
    }

    /// Create a client against another base URL (proxies, tests).
    ///
    /// # Errors
    ///
    /// Returns `AiError::Http` if the HTTP client cannot be built.
    pub fn with_base_url(config: &ProviderConfig, base_url: &str) -> Result<Self, AiError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
            }),
        })
    }

    /// `{base}/v1beta/models/{model}:{method}?key=...` plus extra query pairs.
    fn endpoint(&self, method: &str, extra: &[(&str, &str)]) -> Result<url::Url, AiError> {
        let mut url = url::Url::parse(&format!(
            "{}/v1beta/models/{}:{method}",
            self.inner.base_url, self.inner.model
        ))
        .map_err(|e| AiError::Parse(format!("Invalid Gemini URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in extra {
                query.append_pair(k, v);
            }
            query.append_pair("key", self.inner.api_key.expose_secret());
        }
        Ok(url)
    }

    fn build_request(request: &CompletionRequest) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            system_instruction: request.system.as_deref().map(|system| Content {
                role: None,
                parts: vec![Part { text: system }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: request.json.then_some("application/json"),
            },
        }
    }
}

fn decode_chunk(data: &str) -> Result<SseData, AiError> {
    let chunk: GenerateResponse = serde_json::from_str(data)
        .map_err(|e| AiError::Parse(format!("Failed to parse stream chunk: {e}")))?;
    let text = chunk.text();
    Ok(if text.is_empty() {
        SseData::Skip
    } else {
        SseData::Text(text)
    })
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn provider(&self) -> AiProvider {
        AiProvider::Gemini
    }

    fn model(&self) -> &str {
        &self.inner.model
    }

    #[instrument(skip(self, request), fields(model = %self.inner.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("generateContent", &[])?)
            .json(&Self::build_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Failed to parse response: {e}")))?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }

        Ok(Completion {
            text,
            provider: AiProvider::Gemini,
            model: self.inner.model.clone(),
        })
    }

    #[instrument(skip(self, request), fields(model = %self.inner.model))]
    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, AiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("streamGenerateContent", &[("alt", "sse")])?)
            .json(&Self::build_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(text_stream(response, decode_chunk))
    }
}
