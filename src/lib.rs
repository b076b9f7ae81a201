//! CodeQuest Judge - Submission Lifecycle Service
//!
//! This library provides the submission side of the CodeQuest competitive
//! programming platform: code goes to Judge0 as one batch per submission,
//! verdicts come back per test case and are folded into a single status.
//!
//! # Features
//!
//! - Batch dispatch to Judge0 (optionally through RapidAPI)
//! - Push (callback) and pull (refresh) verdict reconciliation
//! - Owner-scoped status queries with per-test-case results
//! - A polling client with exponential backoff and cancellation
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Business logic
//! - **Store / Repositories**: Database access
//! - **Judge**: The remote execution service
//! - **Models**: Domain models

pub mod client;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod judge;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

use std::time::Duration;

use axum::{Router, http::StatusCode, middleware as axum_middleware};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    constants::{API_BASE_PATH, MAX_REQUEST_BODY_BYTES, REQUEST_TIMEOUT_SECS},
    middleware::{logging_middleware, optional_auth_middleware, rate_limit_middleware},
};

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Build the full application router.
///
/// Rate limiting reads the peer address, so serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest(API_BASE_PATH, handlers::routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
