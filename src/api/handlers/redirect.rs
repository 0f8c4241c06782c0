//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code through the cache-aside service
/// 2. Queue a visit event for the background worker
/// 3. Return `302 Found` with a `Location` header
///
/// Visit events are sent with `try_send`. If the queue is full the event is
/// dropped and counted; the redirect never waits on telemetry.
///
/// # Errors
///
/// Returns 404 Not Found if the code doesn't exist or has expired.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let original_url = state.resolution_service.resolve(&code).await?;

    let event = VisitEvent::new(
        code,
        Some(client_ip(&headers, addr, state.behind_proxy)),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    );

    match state.visit_sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            metrics::counter!("shortlink_visits_dropped_total").increment(1);
            warn!("Visit queue full, dropping visit for {}", event.code);
        }
        Err(TrySendError::Closed(_)) => {
            warn!("Visit queue closed, visit not recorded");
        }
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, original_url)]).into_response())
}
