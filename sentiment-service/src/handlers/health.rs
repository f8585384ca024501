use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

use crate::services::metrics::get_metrics;
use crate::startup::AppState;

/// Liveness check.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "sentiment-service",
        "version": env!("CARGO_PKG_VERSION"),
        "variant": state.config.variant.as_str()
    }))
}

/// Readiness check: the active provider must answer its health check.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.analyzer.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Provider health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(StatusCode::OK)
}

/// Prometheus scrape endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}

pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Route not found"))
}
