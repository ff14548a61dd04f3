//! SERP research through Serper.dev.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

const SERPER_API_URL: &str = "https://google.serper.dev";

/// Errors from the Serper API.
#[derive(Debug, Error)]
pub enum SerperError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serper returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// Response did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganicResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// Search results for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub organic: Vec<OrganicResult>,
    pub people_also_ask: Vec<String>,
}

impl SearchResults {
    /// Render results as prompt context.
    #[must_use]
    pub fn to_prompt_text(&self, max_results: usize) -> String {
        let mut out = String::new();
        if !self.organic.is_empty() {
            out.push_str("Top search results:\n");
            for (i, r) in self.organic.iter().take(max_results).enumerate() {
                out.push_str(&format!("{}. {} - {}\n   {}\n", i + 1, r.title, r.link, r.snippet));
            }
        }
        if !self.people_also_ask.is_empty() {
            out.push_str("People also ask:\n");
            for question in &self.people_also_ask {
                out.push_str(&format!("- {question}\n"));
            }
        }
        out
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
    #[serde(default)]
    people_also_ask: Vec<PeopleAlsoAsk>,
}

#[derive(Deserialize)]
struct PeopleAlsoAsk {
    question: String,
}

/// Serper.dev search client.
#[derive(Clone)]
pub struct SerperClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl SerperClient {
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: SecretString) -> Self {
        Self::with_base_url(client, api_key, SERPER_API_URL)
    }

    #[must_use]
    pub fn with_base_url(client: reqwest::Client, api_key: SecretString, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Google search for `query`, `num` results (1..=100).
    ///
    /// # Errors
    ///
    /// Returns a `SerperError` if the request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, num: u32) -> Result<SearchResults, SerperError> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", self.api_key.expose_secret())
            .json(&serde_json::json!({ "q": query, "num": num.clamp(1, 100) }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SerperError::Api {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }

        let parsed: SerperResponse =
            serde_json::from_str(&text).map_err(|e| SerperError::Parse(e.to_string()))?;
        Ok(SearchResults {
            organic: parsed.organic,
            people_also_ask: parsed
                .people_also_ask
                .into_iter()
                .map(|p| p.question)
                .collect(),
        })
    }
}
