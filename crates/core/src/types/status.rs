//! Status and classification enums shared across the workspace.
//!
//! The `postgres` feature maps each enum onto a native `PostgreSQL` enum type
//! in the `contentforge` schema (see `crates/api/migrations`).

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing one of the enums in this module from a string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Human name of the enum, e.g. `platform`.
    kind: &'static str,
    /// The rejected input.
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// External platform a website can be connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "contentforge.platform", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Shopify Admin API: products, descriptions and blog articles.
    Shopify,
    /// WordPress REST API with an application password.
    #[serde(rename = "wordpress")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "wordpress"))]
    WordPress,
    /// Google Search Console, read-only performance data.
    SearchConsole,
}

impl Platform {
    /// Wire name used in URLs and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shopify => "shopify",
            Self::WordPress => "wordpress",
            Self::SearchConsole => "search_console",
        }
    }

    /// Whether content can be published to this platform.
    #[must_use]
    pub const fn is_publish_target(self) -> bool {
        matches!(self, Self::Shopify | Self::WordPress)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shopify" => Ok(Self::Shopify),
            "wordpress" | "word_press" => Ok(Self::WordPress),
            "search_console" | "search-console" => Ok(Self::SearchConsole),
            _ => Err(ParseEnumError::new("platform", s)),
        }
    }
}

/// Large-language-model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    /// `OpenAI` chat completions.
    #[serde(alias = "open_ai")]
    Openai,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Openai => f.write_str("openai"),
            Self::Gemini => f.write_str("gemini"),
        }
    }
}

impl FromStr for AiProvider {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::Openai),
            "gemini" | "google" => Ok(Self::Gemini),
            _ => Err(ParseEnumError::new("ai provider", s)),
        }
    }
}

/// Lifecycle of a generated content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "contentforge.content_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    /// Generated or edited, not yet on any platform.
    #[default]
    Draft,
    /// Written to a platform; `platform` and `external_id` are set.
    Published,
    /// Retired by the user.
    Archived,
}

/// What a content item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "contentforge.content_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Blog post.
    #[default]
    Article,
    /// Product copy kept as a content item.
    ProductDescription,
    /// Standalone site page.
    Page,
}

/// Review state of a generated product description.
///
/// ```text
/// pending --approve--> approved --publish--> published
///    |  ^                 |
///    |  +---regenerate----+-- rejected
///    +------reject------------^
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "contentforge.description_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionStatus {
    /// Waiting for review. Editable.
    #[default]
    Pending,
    /// Accepted, ready to publish.
    Approved,
    /// Turned down. Only regeneration brings it back.
    Rejected,
    /// Written to Shopify. Terminal.
    Published,
}

impl DescriptionStatus {
    /// Whether moving from `self` to `next` is a legal review transition.
    ///
    /// Anything else is answered with 409 by the API. `Published` has no
    /// way out; a revert is recorded on the published record instead.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Published | Self::Rejected)
                | (Self::Rejected, Self::Pending)
        )
    }
}

impl fmt::Display for DescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Approved => f.write_str("approved"),
            Self::Rejected => f.write_str("rejected"),
            Self::Published => f.write_str("published"),
        }
    }
}

impl FromStr for DescriptionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "published" => Ok(Self::Published),
            _ => Err(ParseEnumError::new("description status", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_str_accepts_aliases() {
        assert_eq!("wordpress".parse::<Platform>().unwrap(), Platform::WordPress);
        assert_eq!("word_press".parse::<Platform>().unwrap(), Platform::WordPress);
        assert_eq!(Platform::WordPress.to_string(), "wordpress");
        assert_eq!(
            "search-console".parse::<Platform>().unwrap(),
            Platform::SearchConsole
        );
        assert!("medium".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_publish_targets() {
        assert!(Platform::Shopify.is_publish_target());
        assert!(Platform::WordPress.is_publish_target());
        assert!(!Platform::SearchConsole.is_publish_target());
    }

    #[test]
    fn test_platform_serde_matches_display() {
        for platform in [Platform::Shopify, Platform::WordPress, Platform::SearchConsole] {
            let json = serde_json::to_string(&platform).unwrap();
            assert_eq!(json, format!("\"{platform}\""));
        }
    }

    #[test]
    fn test_ai_provider_parse() {
        assert_eq!("OpenAI".parse::<AiProvider>().unwrap(), AiProvider::Openai);
        assert_eq!("google".parse::<AiProvider>().unwrap(), AiProvider::Gemini);
        let err = "claude".parse::<AiProvider>().unwrap_err();
        assert_eq!(err.to_string(), "invalid ai provider: claude");
    }

    #[test]
    fn test_description_status_transitions() {
        use DescriptionStatus::{Approved, Pending, Published, Rejected};

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Published));
        assert!(Approved.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Pending));

        assert!(!Pending.can_transition_to(Published));
        assert!(!Published.can_transition_to(Pending));
        assert!(!Published.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
    }

    #[test]
    fn test_content_status_default_is_draft() {
        assert_eq!(ContentStatus::default(), ContentStatus::Draft);
    }
}
