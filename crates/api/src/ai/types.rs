//! Provider-neutral request and response types.

use contentforge_core::AiProvider;
use serde::Serialize;

/// One prompt to a language model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt.
    pub system: Option<String>,
    /// User prompt.
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider for a JSON object response.
    pub json: bool,
}

impl CompletionRequest {
    /// Plain-text request with a system prompt.
    #[must_use]
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
            json: false,
        }
    }

    /// Request a JSON object response.
    #[must_use]
    pub const fn json(mut self) -> Self {
        self.json = true;
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A finished (non-streaming) completion.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub text: String,
    pub provider: AiProvider,
    pub model: String,
}
