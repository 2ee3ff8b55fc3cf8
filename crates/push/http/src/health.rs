//! Service health reporting.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

/// Name under which the dispatch service reports its health.
pub const PUSH_SERVICE: &str = "push";

/// Health status of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServingStatus {
    Unknown,
    Serving,
    NotServing,
}

/// Shared table of per-service health. The empty name is the whole server.
#[derive(Debug, Clone, Default)]
pub struct HealthReporter {
    statuses: Arc<RwLock<HashMap<String, ServingStatus>>>,
}

impl HealthReporter {
    /// Create a reporter with the server and dispatch service marked serving.
    pub fn serving() -> Self {
        let reporter = Self::default();
        reporter.set_status("", ServingStatus::Serving);
        reporter.set_status(PUSH_SERVICE, ServingStatus::Serving);
        reporter
    }

    pub fn set_status(&self, service: impl Into<String>, status: ServingStatus) {
        self.statuses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(service.into(), status);
    }

    /// Mark every registered service as not serving.
    pub fn shutdown(&self) {
        let mut statuses = self.statuses.write().unwrap_or_else(PoisonError::into_inner);
        for status in statuses.values_mut() {
            *status = ServingStatus::NotServing;
        }
    }

    /// Status of a registered service.
    pub fn status(&self, service: &str) -> Option<ServingStatus> {
        self.statuses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .copied()
    }
}

/// Health check query.
#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub service: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServingStatus,
}

/// Report the health of a service.
pub async fn health_handler(
    State(reporter): State<HealthReporter>,
    Query(query): Query<HealthQuery>,
) -> impl IntoResponse {
    match reporter.status(&query.service) {
        Some(status) => {
            let code = match status {
                ServingStatus::Serving => StatusCode::OK,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            };
            (code, Json(HealthResponse { status }))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(HealthResponse {
                status: ServingStatus::Unknown,
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter() {
        let reporter = HealthReporter::serving();
        assert_eq!(reporter.status(""), Some(ServingStatus::Serving));
        assert_eq!(reporter.status(PUSH_SERVICE), Some(ServingStatus::Serving));
        assert_eq!(reporter.status("other"), None);

        reporter.shutdown();
        assert_eq!(reporter.status(PUSH_SERVICE), Some(ServingStatus::NotServing));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&ServingStatus::NotServing).unwrap(),
            r#""NOT_SERVING""#
        );
        assert_eq!(
            serde_json::to_string(&ServingStatus::Unknown).unwrap(),
            r#""UNKNOWN""#
        );
    }
}
