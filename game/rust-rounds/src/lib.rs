use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod terminal;
pub mod utils;

pub use config::Config;
pub use error::GameError;
pub use services::AppState;

/// Router for the dev backend.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api", api_routes())
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/question", get(handlers::questions::get_question))
        .route("/guess", post(handlers::questions::submit_guess))
        .route(
            "/high-scores",
            get(handlers::high_scores::get_high_scores)
                .post(handlers::high_scores::submit_high_score),
        )
}
