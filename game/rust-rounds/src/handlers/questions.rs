use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::AppJson,
    models::{GuessRequest, PartitionQuery, RoundConfig},
    services::{question_service::TokenError, AppState},
};

/// GET /api/question?game=<mode>&difficulty=<n>
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PartitionQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let config = RoundConfig::from(query);

    match state.questions.issue(config) {
        Ok(question) => {
            tracing::debug!(%config, token = %question.token, "question issued");
            Ok((StatusCode::OK, Json(question)))
        }
        Err(e) => {
            tracing::error!("Failed to build question for {}: {}", config, e);
            Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

/// POST /api/guess { token, answer }
pub async fn submit_guess(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<GuessRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.questions.check_guess(&request) {
        Ok(result) => {
            tracing::info!(correct = result.correct, "guess checked");
            Ok((StatusCode::OK, Json(result)))
        }
        Err(e @ TokenError::Invalid) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e @ TokenError::AlreadyUsed) => {
            tracing::warn!("Rejected reused token {}", request.token);
            Err((StatusCode::CONFLICT, e.to_string()))
        }
    }
}
