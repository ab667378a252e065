//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video record creation and lookup
//! - Multipart video and thumbnail uploads fed through the ingestion pipeline
//! - HS256 bearer token verification
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use store::{MemoryVideoStore, RecordField, VideoStore};
