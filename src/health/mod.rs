//! Health check endpoints

use crate::connection::NsqdConnection;
use crate::metrics::PoolMetrics;
use crate::pool::{PoolState, SharedPool};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub connections_total: usize,
    pub connections_ready: usize,
    pub connections_failed: usize,
}

/// Application state for health endpoints
#[derive(Clone)]
pub struct AppState {
    pub pool: SharedPool<NsqdConnection>,
    pub pool_state: PoolState,
    pub metrics: Option<PoolMetrics>,
}

/// Create the health check router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health endpoint - always returns 200 if process is running
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness endpoint - returns 200 if at least one connection is open
async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = ReadyResponse {
        ready: state.pool_state.is_ready(),
        connections_total: state.pool.len(),
        connections_ready: state.pool_state.connected_count(),
        connections_failed: state.pool_state.failed_count(),
    };

    if response.ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Metrics endpoint - returns Prometheus format metrics
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let Some(metrics) = state.metrics else {
        return (StatusCode::NOT_FOUND, "metrics disabled\n".to_string()).into_response();
    };

    metrics.set_connections(state.pool.len());
    metrics.set_connections_ready(state.pool_state.connected_count());

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        metrics.render(),
    )
        .into_response()
}
