//! Axum HTTP API server.
//!
//! This crate provides:
//! - The upload coordinator (single-shot and multi-part)
//! - Job status queries with regenerated signed output URLs
//! - Duration analysis
//! - The SSE progress gateway
//! - Health/readiness endpoints and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
