//! Types shared by the ContentForge API server and CLI.
//!
//! Row identifiers, the account email type and the status enums that cross
//! the HTTP, database and job boundaries. With the `postgres` feature the
//! types also encode and decode through sqlx.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
