//! Authentication route handlers.
//!
//! Email/password accounts with a session cookie.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;

use contentforge_core::{Email, UserId};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::db::UserRepository;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Credentials for register and login.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The logged-in user as returned by the API.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: Email,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    // New id on every login
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));
    Ok(())
}

/// Create an account and log it in.
///
/// POST /api/auth/register
///
/// # Errors
///
/// 400 for an invalid email or short password, 409 if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.password)
        .await?;
    start_session(&session, &user).await?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Log in.
///
/// POST /api/auth/login
///
/// # Errors
///
/// 401 for unknown email or wrong password (same message for both).
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Credentials>,
) -> Result<Json<UserResponse>, AppError> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;
    start_session(&session, &user).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(UserResponse::from(user)))
}

/// Log out.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// 500 if the session store fails.
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in account, re-read from the database.
///
/// GET /api/auth/me
///
/// # Errors
///
/// 401 without a session, or when the account behind it no longer exists
/// (the session is cleared).
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserResponse>, AppError> {
    if let Some(user) = UserRepository::new(state.pool()).get_by_id(current.id).await? {
        return Ok(Json(UserResponse::from(user)));
    }

    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    Err(AppError::Unauthorized("Authentication required".to_string()))
}
