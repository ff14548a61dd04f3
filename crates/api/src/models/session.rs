//! What the session cookie resolves to.

use serde::{Deserialize, Serialize};

use contentforge_core::{Email, UserId};

/// The signed-in account, as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
}

pub mod session_keys {
    pub const CURRENT_USER: &str = "current_user";
}
