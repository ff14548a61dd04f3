//! Request middleware.
//!
//! Applied in `main` (outermost first): Sentry, CORS when configured,
//! `TraceLayer`, request id, sessions. The governor limiters wrap only the
//! auth and language model routes, see [`crate::routes::routes`].
//!
//! - [`auth`]: the [`RequireAuth`] extractor and session user helpers
//! - [`cors`]: credentialed CORS for a frontend on another origin
//! - [`rate_limit`]: per-IP limits keyed on proxy headers
//! - [`request_id`]: `x-request-id` propagation
//! - [`session`]: `PostgreSQL`-backed cookie sessions

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{RequireAuth, clear_current_user, set_current_user};
pub use cors::cors_layer;
pub use rate_limit::{auth_rate_limiter, generation_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
