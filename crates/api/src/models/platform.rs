//! Per-website connections to external platforms.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use contentforge_core::{Platform, PlatformConfigId, WebsiteId};

/// Stored platform connection. One per (website, platform).
///
/// The meaning of the fields depends on the platform:
///
/// | platform | `base_url` | `username` | `secret` |
/// |---|---|---|---|
/// | shopify | `*.myshopify.com` domain | - | Admin API access token |
/// | wordpress | site URL | WordPress user | application password |
/// | `search_console` | property URL | - | OAuth access token |
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone, sqlx::FromRow)]
pub struct PlatformConfig {
    pub id: PlatformConfigId,
    pub website_id: WebsiteId,
    pub platform: Platform,
    pub base_url: String,
    pub username: Option<String>,
    pub secret: Option<String>,
    pub settings: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("id", &self.id)
            .field("website_id", &self.website_id)
            .field("platform", &self.platform)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl PlatformConfig {
    /// The stored secret, wrapped so it cannot be logged by accident.
    #[must_use]
    pub fn secret(&self) -> Option<SecretString> {
        self.secret.clone().map(SecretString::from)
    }

    /// Public view without the secret.
    #[must_use]
    pub fn view(&self) -> PlatformConfigView {
        PlatformConfigView {
            id: self.id,
            website_id: self.website_id,
            platform: self.platform,
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            has_secret: self.secret.as_deref().is_some_and(|s| !s.is_empty()),
            settings: self.settings.0.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Platform connection as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformConfigView {
    pub id: PlatformConfigId,
    pub website_id: WebsiteId,
    pub platform: Platform,
    pub base_url: String,
    pub username: Option<String>,
    pub has_secret: bool,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of an upsert.
///
/// Omitting `secret` on update keeps the stored one.
#[derive(Clone, Deserialize)]
pub struct PlatformConfigInput {
    pub base_url: String,
    pub username: Option<String>,
    pub secret: Option<String>,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}

impl std::fmt::Debug for PlatformConfigInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfigInput")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}
