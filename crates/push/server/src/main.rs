//! Push Server - notification dispatch over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use color_eyre::eyre::WrapErr as _;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("push-server starting");

    let config = push_core::Config::load().wrap_err("failed to load configuration")?;

    // Providers
    let providers =
        push_provider::build_router(&config.providers).wrap_err("failed to build providers")?;
    for platform in push_core::Platform::ALL {
        if providers.get(platform).is_none() {
            tracing::warn!(platform = %platform, "no provider configured, requests will fail");
        }
    }

    let dispatcher = Arc::new(push_dispatch::Dispatcher::new(
        config.dispatch.clone(),
        providers,
    ));
    let health = push_http::HealthReporter::serving();

    // Build router
    let app = Router::new()
        .merge(push_http::router(dispatcher, health.clone()))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .wrap_err_with(|| format!("invalid listen address {}", config.listen_addr))?;
    tracing::info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err("failed to bind")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(health))
        .await
        .wrap_err("server error")?;

    tracing::info!("push-server stopped");

    Ok(())
}

/// Resolve on Ctrl-C, flipping health to not serving first.
async fn shutdown_signal(health: push_http::HealthReporter) {
    wait_for_shutdown(tokio::signal::ctrl_c(), health).await;
}

/// Resolve once `signal` fires. A signal that cannot be installed never
/// resolves, so the server keeps running without a shutdown hook.
async fn wait_for_shutdown(
    signal: impl Future<Output = std::io::Result<()>>,
    health: push_http::HealthReporter,
) {
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutdown requested, draining in-flight requests");
    health.shutdown();
}
