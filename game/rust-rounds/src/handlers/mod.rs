use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod high_scores;
pub mod questions;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let catalog_size = state.questions.catalog_size();
    let status = if catalog_size > 0 { "healthy" } else { "degraded" };
    let status_code = if catalog_size > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "trivia-dev-backend",
            "version": env!("CARGO_PKG_VERSION"),
            "catalog_size": catalog_size,
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}
