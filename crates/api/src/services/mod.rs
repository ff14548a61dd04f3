//! Business logic services.

pub mod auth;
pub mod connections;
pub mod publishing;

pub use connections::{Connections, VerifiedConnection};
pub use publishing::PublishOptions;
