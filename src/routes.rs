//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`                 - Short link redirect
//! - `GET  /health`                 - Health check: DB, cache, visit queue
//! - `POST /api/urls`               - Create a short link
//! - `GET  /api/urls/{code}/stats`  - Link statistics
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Metrics** - Request counter and latency histogram per matched route
//! - **CORS** - Any origin; `GET`, `POST` and preflight `OPTIONS`
//! - **Timeout** - Per-request deadline, answered with 408
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{metrics as http_metrics, tracing};
use crate::state::AppState;
use axum::Router;
use axum::http::{Method, StatusCode};
use axum::middleware;
use axum::routing::get;
use std::time::Duration;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::timeout::TimeoutLayer;

/// Constructs the application router with all routes and middleware.
///
/// Dropping a timed-out request cancels its in-flight store and cache calls.
/// Background work already spawned by the service is not affected.
pub fn app_router(state: AppState, request_timeout: Duration) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api", api::routes::api_routes())
        .route_layer(middleware::from_fn(http_metrics::track))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer())
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
