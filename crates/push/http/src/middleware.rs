//! HTTP middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

/// Paths polled by orchestrators; logged at debug to keep the info stream quiet.
const PROBE_PATHS: &[&str] = &["/healthz"];

/// Log each request with its status and latency.
///
/// Server errors are raised to warn; health probes drop to debug.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match classify(&path, status) {
        Level::Warn => {
            tracing::warn!(%method, %path, %status, elapsed_ms, "request failed");
        }
        Level::Info => {
            tracing::info!(%method, %path, %status, elapsed_ms, "request completed");
        }
        Level::Debug => {
            tracing::debug!(%method, %path, %status, elapsed_ms, "probe");
        }
    }

    response
}

#[derive(Debug, PartialEq, Eq)]
enum Level {
    Warn,
    Info,
    Debug,
}

fn classify(path: &str, status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::Warn
    } else if PROBE_PATHS.contains(&path) {
        Level::Debug
    } else {
        Level::Info
    }
}
