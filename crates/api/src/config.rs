//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (`API_DATABASE_URL` takes precedence)
//! - `API_BASE_URL` - Public URL of the API (decides whether cookies are `Secure`)
//! - `API_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - At least one of `OPENAI_API_KEY` / `GEMINI_API_KEY`
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 3000)
//! - `OPENAI_MODEL` - `OpenAI` chat model (default: gpt-4o-mini)
//! - `GEMINI_MODEL` - Gemini model (default: gemini-1.5-flash)
//! - `DEFAULT_AI_PROVIDER` - `openai` or `gemini` (default: first configured)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-10)
//! - `SHOPIFY_CACHE_TTL_SECS` - Product page cache TTL (default: 300)
//! - `SERPER_API_KEY` - Serper.dev key (enables SERP research)
//! - `API_CORS_ORIGINS` - Comma-separated browser origins allowed to call the
//!   API with cookies (default: none, same-origin only)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (crawler)
//! - `CRAWLER_MAX_URLS` - Page URL cap per sitemap index (default: 500)
//! - `CRAWLER_BATCH_SIZE` - Child sitemaps fetched concurrently (default: 5)
//! - `CRAWLER_MAX_DEPTH` - Sitemap index nesting limit (default: 3)
//! - `CRAWLER_MAX_SITEMAPS` - Sitemap documents fetched per run (default: 50)
//! - `CRAWLER_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `CRAWLER_USER_AGENT` - User-Agent header for crawler requests

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use contentforge_core::AiProvider;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-10";
const DEFAULT_USER_AGENT: &str = concat!("ContentForgeBot/", env!("CARGO_PKG_VERSION"));

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Origins allowed by CORS, e.g. `https://app.example.com`
    pub cors_origins: Vec<String>,
    /// Language model providers
    pub ai: AiConfig,
    /// Shopify Admin API settings shared by every connected store
    pub shopify: ShopifySettings,
    /// Serper.dev configuration (optional - enables SERP research)
    pub serper: Option<SerperConfig>,
    /// Sitemap crawler limits
    pub crawler: CrawlerConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Credentials and model choice for a single LLM provider.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Provider API key
    pub api_key: SecretString,
    /// Model ID
    pub model: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Language model configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// `OpenAI` chat completions (optional)
    pub openai: Option<ProviderConfig>,
    /// Google Gemini (optional)
    pub gemini: Option<ProviderConfig>,
    /// Provider used when a request does not name one
    pub default_provider: AiProvider,
}

/// Shopify settings that are not per-store.
#[derive(Debug, Clone)]
pub struct ShopifySettings {
    /// Admin API version (e.g., 2024-10)
    pub api_version: String,
    /// TTL of cached product pages
    pub cache_ttl: Duration,
}

/// Serper.dev configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SerperConfig {
    /// Serper API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for SerperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerperConfig")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Limits applied by the sitemap crawler.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum distinct page URLs collected per run
    pub max_urls: usize,
    /// Child sitemaps fetched concurrently per batch
    pub batch_size: usize,
    /// Maximum sitemap index nesting (root = 0)
    pub max_depth: usize,
    /// Maximum sitemap documents fetched per run
    pub max_sitemaps: usize,
    /// Per-request timeout
    pub timeout: Duration,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_urls: 500,
            batch_size: 5,
            max_depth: 3,
            max_sitemaps: 50,
            timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url_from_env()?;
        let host = parse_env("API_HOST", "127.0.0.1")?;
        let port = parse_env("API_PORT", "3000")?;
        let base_url = get_required_env("API_BASE_URL")?;
        let session_secret = get_validated_secret("API_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "API_SESSION_SECRET")?;
        let cors_origins = get_optional_env("API_CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .transpose()?
            .unwrap_or_default();

        let ai = AiConfig::from_env()?;
        let shopify = ShopifySettings::from_env()?;
        let serper = SerperConfig::from_env();
        let crawler = CrawlerConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            cors_origins,
            ai,
            shopify,
            serper,
            crawler,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the API is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let openai = get_optional_env("OPENAI_API_KEY")
            .map(|key| {
                validate_secret_strength(&key, "OPENAI_API_KEY")?;
                Ok::<_, ConfigError>(ProviderConfig {
                    api_key: SecretString::from(key),
                    model: get_env_or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                })
            })
            .transpose()?;
        let gemini = get_optional_env("GEMINI_API_KEY")
            .or_else(|| get_optional_env("GOOGLE_API_KEY"))
            .map(|key| {
                validate_secret_strength(&key, "GEMINI_API_KEY")?;
                Ok::<_, ConfigError>(ProviderConfig {
                    api_key: SecretString::from(key),
                    model: get_env_or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                })
            })
            .transpose()?;

        let default_provider = match get_optional_env("DEFAULT_AI_PROVIDER") {
            Some(raw) => AiProvider::from_str(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("DEFAULT_AI_PROVIDER".to_string(), e.to_string())
            })?,
            None if openai.is_some() => AiProvider::Openai,
            None => AiProvider::Gemini,
        };

        let config = Self {
            openai,
            gemini,
            default_provider,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that at least one provider is configured and that the default
    /// provider is one of them.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.is_none() && self.gemini.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "OPENAI_API_KEY or GEMINI_API_KEY".to_string(),
            ));
        }
        if self.provider(self.default_provider).is_none() {
            return Err(ConfigError::InvalidEnvVar(
                "DEFAULT_AI_PROVIDER".to_string(),
                format!("{} is not configured", self.default_provider),
            ));
        }
        Ok(())
    }

    /// Returns the configuration of a provider, if set.
    #[must_use]
    pub const fn provider(&self, provider: AiProvider) -> Option<&ProviderConfig> {
        match provider {
            AiProvider::Openai => self.openai.as_ref(),
            AiProvider::Gemini => self.gemini.as_ref(),
        }
    }
}

impl ShopifySettings {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs: u64 = parse_env("SHOPIFY_CACHE_TTL_SECS", "300")?;
        Ok(Self {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
            cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

impl Default for ShopifySettings {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_SHOPIFY_API_VERSION.to_string(),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl SerperConfig {
    /// Returns `None` if `SERPER_API_KEY` is not set (research disabled).
    fn from_env() -> Option<Self> {
        get_optional_env("SERPER_API_KEY").map(|key| {
            if let Err(e) = validate_secret_strength(&key, "SERPER_API_KEY") {
                tracing::warn!("SERPER_API_KEY validation warning: {e}");
            }
            Self {
                api_key: SecretString::from(key),
            }
        })
    }
}

impl CrawlerConfig {
    /// Limits from `CRAWLER_*` variables, defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparsable or zero limits.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            max_urls: parse_env("CRAWLER_MAX_URLS", &defaults.max_urls.to_string())?,
            batch_size: parse_env("CRAWLER_BATCH_SIZE", &defaults.batch_size.to_string())?,
            max_depth: parse_env("CRAWLER_MAX_DEPTH", &defaults.max_depth.to_string())?,
            max_sitemaps: parse_env("CRAWLER_MAX_SITEMAPS", &defaults.max_sitemaps.to_string())?,
            timeout: Duration::from_secs(parse_env(
                "CRAWLER_TIMEOUT_SECS",
                &defaults.timeout.as_secs().to_string(),
            )?),
            user_agent: get_env_or_default("CRAWLER_USER_AGENT", &defaults.user_agent),
        };

        if config.batch_size == 0 || config.max_urls == 0 || config.max_sitemaps == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CRAWLER_*".to_string(),
                "batch size, URL cap and sitemap cap must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Database URL from `API_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    get_database_url("API_DATABASE_URL")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Split a comma-separated origin list. Each entry must be a bare
/// `scheme://host[:port]`.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let invalid = |why: &str| {
                ConfigError::InvalidEnvVar("API_CORS_ORIGINS".to_string(), format!("{entry}: {why}"))
            };
            let url = url::Url::parse(entry).map_err(|e| invalid(&e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(invalid("must be an http(s) origin"));
            }
            if url.path() != "/" || url.query().is_some() {
                return Err(invalid("must not have a path"));
            }
            Ok(url.origin().ascii_serialization())
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn provider(key: &str, model: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: SecretString::from(key),
            model: model.to_string(),
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-api-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("sk-aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_ai_config_requires_a_provider() {
        let config = AiConfig {
            openai: None,
            gemini: None,
            default_provider: AiProvider::Openai,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_ai_config_default_must_be_configured() {
        let config = AiConfig {
            openai: None,
            gemini: Some(provider("g-key", DEFAULT_GEMINI_MODEL)),
            default_provider: AiProvider::Openai,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));

        let config = AiConfig {
            default_provider: AiProvider::Gemini,
            ..config
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.provider(AiProvider::Gemini).unwrap().model,
            DEFAULT_GEMINI_MODEL
        );
        assert!(config.provider(AiProvider::Openai).is_none());
    }

    #[test]
    fn test_crawler_defaults() {
        let crawler = CrawlerConfig::default();
        assert_eq!(crawler.max_urls, 500);
        assert_eq!(crawler.batch_size, 5);
        assert_eq!(crawler.max_depth, 3);
        assert_eq!(crawler.max_sitemaps, 50);
        assert!(crawler.user_agent.starts_with("ContentForgeBot/"));
    }

    #[test]
    fn test_provider_config_debug_redacts_secrets() {
        let config = provider("sk-super-secret-key", "gpt-4o-mini");
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("gpt-4o-mini"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-super-secret-key"));
    }

    #[test]
    fn test_serper_config_debug_redacts_secrets() {
        let config = SerperConfig {
            api_key: SecretString::from("serper-secret"),
        };
        assert!(!format!("{config:?}").contains("serper-secret"));
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" https://app.acme.test, http://localhost:5173/ ,").unwrap();
        assert_eq!(origins, vec!["https://app.acme.test", "http://localhost:5173"]);

        assert!(parse_origins("app.acme.test").is_err());
        assert!(parse_origins("https://app.acme.test/dashboard").is_err());
        assert!(parse_origins("ftp://files.acme.test").is_err());
    }
}
