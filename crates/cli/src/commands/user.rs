//! User management commands.
//!
//! ```bash
//! cf-cli user create -e writer@example.com -p 'correct horse battery'
//! ```

use contentforge_api::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a user with a password, same rules as `/api/auth/register`.
///
/// Returns the new user's ID.
pub async fn create(email: &str, password: &str) -> Result<i32, UserError> {
    let pool = connect().await?;
    let user = AuthService::new(&pool).register(email, password).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "User created");
    Ok(user.id.as_i32())
}
