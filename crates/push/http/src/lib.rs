//! Push HTTP Layer
//!
//! Axum handlers exposing the dispatch engine and service health.

mod handlers;
mod health;
mod middleware;

pub use handlers::*;
pub use health::*;
pub use middleware::*;

use std::sync::Arc;

use axum::Router;
use push_dispatch::Dispatcher;
use push_provider::Provider;

/// Create the push API router.
pub fn push_router<P>(dispatcher: Arc<Dispatcher<P>>) -> Router
where
    P: Provider + 'static,
{
    use axum::routing::post;

    Router::new()
        .route("/api/push", post(handlers::push_handler::<P>))
        .with_state(dispatcher)
}

/// Create the health check router.
pub fn health_router(reporter: HealthReporter) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/healthz", get(health::health_handler))
        .with_state(reporter)
}

/// Push and health routes behind the logging middleware.
pub fn router<P>(dispatcher: Arc<Dispatcher<P>>, reporter: HealthReporter) -> Router
where
    P: Provider + 'static,
{
    Router::new()
        .merge(push_router(dispatcher))
        .merge(health_router(reporter))
        .layer(axum::middleware::from_fn(logging_middleware))
}
