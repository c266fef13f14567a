use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    models::{HighScoreEntry, HighScoresResponse, PartitionQuery, RoundConfig, SubmitHighScoreRequest},
    services::AppState,
};

/// GET /api/high-scores?game=<mode>&difficulty=<n>
pub async fn get_high_scores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PartitionQuery>,
) -> impl IntoResponse {
    let high_scores = state.high_scores.list(RoundConfig::from(query)).await;
    Json(HighScoresResponse { high_scores })
}

/// POST /api/high-scores { score, initials, game, difficulty }
pub async fn submit_high_score(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SubmitHighScoreRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    request
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    let config = request.round_config().ok_or((
        StatusCode::UNPROCESSABLE_ENTITY,
        "difficulty must be between 2 and 6".to_string(),
    ))?;

    tracing::info!(
        "Submitting high score {} for {} at {}",
        request.score,
        request.initials,
        config
    );

    let high_scores = state
        .high_scores
        .submit(config, HighScoreEntry::new(request.initials, request.score))
        .await;

    Ok((StatusCode::OK, Json(HighScoresResponse { high_scores })))
}
