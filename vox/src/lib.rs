//! Self-hostable voice-of-customer hub.
//!
//! Caches Airtable feedback in a local libSQL store, routes each record to an
//! owning team by similarity to a historical ticket corpus, and answers
//! questions over the cached data. The binary in `main.rs` wires these
//! modules into an axum server; integration tests drive them directly.

pub mod airtable;
pub mod api;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod models;
pub mod services;
