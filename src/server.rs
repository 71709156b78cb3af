// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP endpoint exposing the registry to Prometheus.

use crate::constants::{HEALTH_SERVER_PATH, METRICS_CONTENT_TYPE, METRICS_SERVER_PATH};
use crate::metrics::MetricsRegistry;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Build the router serving `/metrics` and `/healthz`.
pub fn router(registry: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route(HEALTH_SERVER_PATH, get(|| async { "ok" }))
        .with_state(registry)
}

async fn metrics_handler(State(registry): State<Arc<MetricsRegistry>>) -> Response {
    match registry.gather() {
        Ok(body) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve the registry on `addr` until the listener fails.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server stops.
pub async fn serve(addr: SocketAddr, registry: Arc<MetricsRegistry>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics server on {addr}"))?;

    info!(%addr, path = METRICS_SERVER_PATH, "Metrics server listening");

    axum::serve(listener, router(registry))
        .await
        .context("Metrics server stopped")
}
