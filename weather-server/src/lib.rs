//! HTTP surface for the Samarinda weather crawler.
//!
//! `routes::build_router` wires the ingestion trigger and the read
//! endpoints over an [`routes::AppState`]; `main.rs` handles flag parsing
//! and process bootstrap.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{AppState, build_router};
