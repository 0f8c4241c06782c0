//! API route configuration.

use crate::api::handlers::{create_url_handler, stats_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes nested under `/api`.
///
/// # Endpoints
///
/// - `POST /urls`               - Create a short link
/// - `GET  /urls/{code}/stats`  - Statistics for a short link
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", post(create_url_handler))
        .route("/urls/{code}/stats", get(stats_handler))
}
