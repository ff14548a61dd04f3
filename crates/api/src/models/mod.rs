//! Domain models.
//!
//! Row types double as domain types: every struct here derives
//! `sqlx::FromRow` and is read straight out of the `contentforge` schema.

pub mod content;
pub mod platform;
pub mod product_description;
pub mod session;
pub mod user;
pub mod website;

pub use content::{Content, ContentUpdate, NewContent};
pub use platform::{PlatformConfig, PlatformConfigInput, PlatformConfigView};
pub use product_description::{PendingProductDescription, PublishedProduct};
pub use session::{CurrentUser, session_keys};
pub use user::User;
pub use website::{BusinessAnalysis, NewWebsite, Website, WebsiteUpdate};
