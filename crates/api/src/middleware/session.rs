//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` (`tower_sessions.session`, created by the
//! first migration) and expire after a week without activity.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ApiConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "cf_session";

/// Idle time before a session is dropped.
const IDLE_TIMEOUT_DAYS: i64 = 7;

/// Create the session layer with the `PostgreSQL` store.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool
/// * `config` - API configuration (cookies are `Secure` when the public base
///   URL is https)
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &ApiConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(PostgresStore::new(pool.clone()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(IDLE_TIMEOUT_DAYS)))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
