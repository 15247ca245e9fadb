pub mod routes;

use crate::clock::Clock;
use crate::config::Config;
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn app(config: Arc<Config>, clock: Arc<dyn Clock>) -> Router {
    routes::router(routes::ApiState { config, clock })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn run_server(config: Arc<Config>, clock: Arc<dyn Clock>) -> Result<()> {
    let addr = SocketAddr::new(config.bind_address, config.api_port);
    let db_path = config.db_path.clone();
    let app = app(config, clock);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server: {addr}"))?;

    info!(address = %addr, db = %db_path.display(), "jobtracker API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
