//! Language model providers.
//!
//! Two providers sit behind the [`LanguageModel`] trait:
//!
//! - [`OpenAiClient`] - `POST /v1/chat/completions`
//! - [`GeminiClient`] - `POST /v1beta/models/{model}:generateContent`
//!
//! [`AiClients`] holds whichever are configured and resolves the provider a
//! request asks for. Streaming responses are decoded from server-sent events
//! into a [`TextStream`] of text deltas.

mod error;
mod gemini;
mod openai;
pub mod sse;
mod types;

use std::sync::Arc;

use async_trait::async_trait;
use contentforge_core::AiProvider;
use serde::de::DeserializeOwned;

use crate::config::AiConfig;

pub use error::AiError;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use sse::TextStream;
pub use types::{Completion, CompletionRequest};

/// A chat-style text generation backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Which provider this is.
    fn provider(&self) -> AiProvider;

    /// Model ID requests are sent to.
    fn model(&self) -> &str;

    /// Generate a complete response.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AiError>;

    /// Generate a response as a stream of text deltas.
    ///
    /// Errors before the first byte (auth, rate limits) are returned
    /// directly; later failures arrive as stream items.
    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, AiError>;
}

/// Configured providers.
#[derive(Clone)]
pub struct AiClients {
    openai: Option<Arc<dyn LanguageModel>>,
    gemini: Option<Arc<dyn LanguageModel>>,
    default_provider: AiProvider,
}

impl AiClients {
    /// Build clients for every provider present in `config`.
    ///
    /// # Errors
    ///
    /// Returns an `AiError` if a client cannot be constructed.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let openai = config
            .openai
            .as_ref()
            .map(|c| OpenAiClient::new(c).map(|client| Arc::new(client) as Arc<dyn LanguageModel>))
            .transpose()?;
        let gemini = config
            .gemini
            .as_ref()
            .map(|c| GeminiClient::new(c).map(|client| Arc::new(client) as Arc<dyn LanguageModel>))
            .transpose()?;

        Ok(Self {
            openai,
            gemini,
            default_provider: config.default_provider,
        })
    }

    /// Build from explicit clients.
    #[must_use]
    pub fn new(
        openai: Option<Arc<dyn LanguageModel>>,
        gemini: Option<Arc<dyn LanguageModel>>,
        default_provider: AiProvider,
    ) -> Self {
        Self {
            openai,
            gemini,
            default_provider,
        }
    }

    /// Provider used when a request does not name one.
    #[must_use]
    pub const fn default_provider(&self) -> AiProvider {
        self.default_provider
    }

    /// Providers that are configured.
    #[must_use]
    pub fn available(&self) -> Vec<AiProvider> {
        [AiProvider::Openai, AiProvider::Gemini]
            .into_iter()
            .filter(|p| self.slot(*p).is_some())
            .collect()
    }

    /// Resolve the requested provider, or the default.
    ///
    /// # Errors
    ///
    /// Returns `AiError::NotConfigured` if the provider has no API key.
    pub fn get(&self, provider: Option<AiProvider>) -> Result<Arc<dyn LanguageModel>, AiError> {
        let provider = provider.unwrap_or(self.default_provider);
        self.slot(provider)
            .cloned()
            .ok_or_else(|| AiError::NotConfigured(provider.to_string()))
    }

    const fn slot(&self, provider: AiProvider) -> Option<&Arc<dyn LanguageModel>> {
        match provider {
            AiProvider::Openai => self.openai.as_ref(),
            AiProvider::Gemini => self.gemini.as_ref(),
        }
    }
}

/// Deserialize a model's JSON answer.
///
/// Models wrap JSON in Markdown fences often enough that the fences are
/// stripped first, as is any prose before the first `{`/`[` or after the
/// last `}`/`]`.
///
/// # Errors
///
/// Returns `AiError::Parse` if no valid JSON of type `T` is found.
pub fn parse_json_output<T: DeserializeOwned>(raw: &str) -> Result<T, AiError> {
    let body = strip_code_fences(raw);
    if let Ok(value) = serde_json::from_str(body) {
        return Ok(value);
    }

    let start = body.find(['{', '[']);
    let end = body.rfind(['}', ']']);
    let candidate = match (start, end) {
        (Some(s), Some(e)) if s < e => body.get(s..=e).unwrap_or(body),
        _ => body,
    };
    serde_json::from_str(candidate)
        .map_err(|e| AiError::Parse(format!("Model returned invalid JSON: {e}")))
}

/// Remove a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````).
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
