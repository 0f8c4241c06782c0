//! Per-request HTTP metrics.
//!
//! Records `http_requests_total` and `http_request_duration_seconds`, both
//! labelled with `method`, `path` (the matched route template, so
//! `/{code}` rather than every short code) and `status`.

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::time::{Duration, Instant};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Label used when no route matched the request.
const UNMATCHED_PATH: &str = "unmatched";

/// Middleware recording a counter and a latency histogram for each request.
///
/// Install with `route_layer` so the matched path is available.
pub async fn track(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());

    let response = next.run(req).await;

    record(method, path, response.status().as_u16(), start.elapsed());
    response
}

fn record(method: String, path: String, status: u16, elapsed: Duration) {
    let labels = [
        ("method", method),
        ("path", path),
        ("status", status.to_string()),
    ];

    ::metrics::counter!(REQUESTS_TOTAL, &labels).increment(1);
    ::metrics::histogram!(REQUEST_DURATION_SECONDS, &labels).record(elapsed.as_secs_f64());
}
