//! Error types for the language model clients.

use thiserror::Error;

/// Errors that can occur when calling a language model provider.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the provider.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse a response or model output.
    #[error("parse error: {0}")]
    Parse(String),

    /// Stream broke off.
    #[error("stream error: {0}")]
    Stream(String),

    /// Provider is not configured on this server.
    #[error("provider {0} is not configured")]
    NotConfigured(String),

    /// Model returned no text.
    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Error envelope shared by `OpenAI` and Gemini:
/// `{"error": {"message": "...", ...}}`.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiErrorDetail,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// Error message.
    pub message: String,
}

/// Map a non-success response to an `AiError`.
pub(crate) async fn error_from_response(response: reqwest::Response) -> AiError {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return AiError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return AiError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            AiError::Api {
                status: status.as_u16(),
                message,
            }
        }
        Err(e) => AiError::Http(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_error_display() {
        let err = AiError::RateLimited(20);
        assert_eq!(err.to_string(), "rate limited, retry after 20 seconds");

        let err = AiError::Api {
            status: 400,
            message: "bad model".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400): bad model");
    }

    #[test]
    fn test_api_error_deserialization() {
        let openai = r#"{"error": {"message": "Incorrect API key", "type": "invalid_request_error", "code": null}}"#;
        let gemini = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;

        let parsed: ApiErrorResponse = serde_json::from_str(openai).expect("deserialize");
        assert_eq!(parsed.error.message, "Incorrect API key");
        let parsed: ApiErrorResponse = serde_json::from_str(gemini).expect("deserialize");
        assert_eq!(parsed.error.message, "API key not valid");
    }
}
