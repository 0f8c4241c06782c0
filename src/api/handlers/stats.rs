//! Handler for link statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns authoritative statistics for a short link.
///
/// # Endpoint
///
/// `GET /api/urls/{code}/stats`
///
/// Always read from the store; the cache is not consulted.
///
/// # Response
///
/// ```json
/// {
///   "short_url": "http://localhost:8000/abc123",
///   "original_url": "https://example.com",
///   "visit_count": 42,
///   "created_at": "2025-01-01T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// Returns 404 Not Found if the code doesn't exist or has expired.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.resolution_service.get_stats(&code).await?;

    Ok(Json(stats.into()))
}
