use crate::config::Config;

pub mod backend_client;
pub mod clock;
pub mod game_loop;
pub mod game_session;
pub mod high_score_service;
pub mod leaderboard_service;
pub mod question_service;
pub mod round_service;
pub mod session_log;
pub mod streak;

use high_score_service::HighScoreStore;
use question_service::QuestionService;

/// Shared state of the dev backend.
pub struct AppState {
    pub config: Config,
    pub questions: QuestionService,
    pub high_scores: HighScoreStore,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let subjects = QuestionService::load_catalog(config.catalog_path.as_deref())?;
        match &config.catalog_path {
            Some(path) => tracing::info!("Loaded {} subjects from {}", subjects.len(), path.display()),
            None => tracing::info!("Loaded {} subjects from the built-in sample catalog", subjects.len()),
        }

        let questions = QuestionService::new(subjects, &config.token_secret);

        Ok(Self {
            config,
            questions,
            high_scores: HighScoreStore::new(),
        })
    }
}
