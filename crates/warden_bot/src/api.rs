//! HTTP API for health and metrics.

use crate::ServiceContext;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};
use warden_error::{ConfigError, WardenResult};

/// Creates the health API router.
pub fn create_router(ctx: Arc<ServiceContext>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .with_state(ctx)
}

/// Health check endpoint. Answers 503 while the store is unreachable.
async fn health_check(State(ctx): State<Arc<ServiceContext>>) -> impl IntoResponse {
    let report = ctx.health().await;
    let code = if report.store_reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

/// Current moderation counters.
async fn get_metrics(State(ctx): State<Arc<ServiceContext>>) -> impl IntoResponse {
    (StatusCode::OK, Json(ctx.metrics()))
}

/// Serve the API on `addr` until `shutdown` turns true.
#[instrument(skip(ctx, shutdown))]
pub async fn serve(
    addr: SocketAddr,
    ctx: Arc<ServiceContext>,
    mut shutdown: watch::Receiver<bool>,
) -> WardenResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ConfigError::new(format!("Cannot bind health API to {}: {}", addr, e)))?;
    info!(%addr, "Health API listening");

    axum::serve(listener, create_router(ctx))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| ConfigError::new(format!("Health API failed: {}", e)))?;
    Ok(())
}
