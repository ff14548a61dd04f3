//! Domain value types.
//!
//! - [`email`]: validated, lowercased account emails
//! - [`id`]: one newtype per table key
//! - [`status`]: platform, provider and lifecycle enums

pub mod email;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
