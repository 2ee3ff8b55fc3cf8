//! Push API handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use push_core::{DispatchError, PushRequest};
use push_dispatch::Dispatcher;
use push_provider::Provider;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Dispatch one push request and return the aggregated reply.
///
/// Dropping the request (client disconnect) drops the dispatch and every
/// attempt still in flight.
pub async fn push_handler<P>(
    State(dispatcher): State<Arc<Dispatcher<P>>>,
    Json(request): Json<PushRequest>,
) -> Response
where
    P: Provider + 'static,
{
    match dispatcher.dispatch(&request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if e.is_contract_violation() {
                tracing::error!(error = %e, "push dispatch failed");
            }
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn status_for(error: &DispatchError) -> StatusCode {
    match error {
        DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
