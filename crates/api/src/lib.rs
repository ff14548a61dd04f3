//! ContentForge API library.
//!
//! The HTTP server lives in `main.rs`; everything it serves is exposed here
//! so the CLI and the integration tests can reuse it.
//!
//! # Modules
//!
//! - [`crawler`] - sitemap index crawler and page extraction
//! - [`ai`] - `OpenAI` and Gemini clients behind [`ai::LanguageModel`]
//! - [`generation`] - prompts and output handling for analysis, articles and
//!   product descriptions
//! - [`shopify`], [`wordpress`], [`search_console`], [`research`] - vendor
//!   clients
//! - [`routes`] - JSON API handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ai;
pub mod config;
pub mod crawler;
pub mod db;
pub mod error;
pub mod generation;
pub mod middleware;
pub mod models;
pub mod research;
pub mod routes;
pub mod search_console;
pub mod services;
pub mod shopify;
pub mod state;
pub mod wordpress;
