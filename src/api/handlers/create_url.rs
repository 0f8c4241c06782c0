//! Handler for short link creation.

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
};
use std::net::SocketAddr;
use validator::Validate;

use crate::api::dto::create_url::{CreateUrlRequest, CreateUrlResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Creates a short link for a URL.
///
/// # Endpoint
///
/// `POST /api/urls`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com/some/long/path",
///   "expires_at": "2025-12-31T23:59:59Z",  // optional
///   "custom_code": "promo2025"             // optional
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "short_url": "http://localhost:8000/promo2025",
///   "original_url": "https://example.com/some/long/path",
///   "short_code": "promo2025",
///   "expires_at": "2025-12-31T23:59:59Z",
///   "created_at": "2025-01-01T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - 400 if the URL or custom code is invalid
/// - 409 if the custom code is taken or no unique code could be allocated
pub async fn create_url_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<CreateUrlResponse>), AppError> {
    payload.validate()?;

    let creator_ip = client_ip(&headers, addr, state.behind_proxy);

    let created = state
        .resolution_service
        .create_short_link(payload.into_command(Some(creator_ip)))
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}
