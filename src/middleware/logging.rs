use std::time::Instant;

use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};

/// Logs every call with its status and latency. Server error bodies are
/// buffered and logged in full.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, 4096).await {
            Ok(b) => b,
            Err(e) => {
                error!("Failed to read error response body: {}", e);
                return Response::from_parts(parts, Body::empty());
            }
        };

        error!(
            "{} failed - Status: {}, Latency: {}ms, Body: {}",
            method,
            status,
            elapsed_ms,
            String::from_utf8_lossy(&bytes)
        );

        parts.headers.remove(axum::http::header::CONTENT_LENGTH);
        return Response::from_parts(parts, Body::from(bytes));
    }

    if status.is_client_error() {
        warn!("{} - Status: {}, Latency: {}ms", method, status, elapsed_ms);
    } else {
        info!("{} - Status: {}, Latency: {}ms", method, status, elapsed_ms);
    }

    response
}
