#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trivia_rounds::{
    config::{Config, LogFormat},
    create_router,
    error::GameError,
    models::{
        Difficulty, GameMode, GuessResult, HighScoreEntry, Initials, Leaderboard, Question,
        QuestionOption, QuestionType, RoundConfig, Token,
    },
    services::{backend_client::TriviaBackend, leaderboard_service::merge_entry, AppState},
};

pub const TEST_SECRET: &str = "test-secret";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn test_config() -> Config {
    Config {
        backend_url: "http://127.0.0.1:0".to_string(),
        initial_round: RoundConfig::default(),
        request_timeout: Duration::from_secs(2),
        bind_addr: "127.0.0.1:0".to_string(),
        token_secret: TEST_SECRET.to_string(),
        catalog_path: None,
        log_format: LogFormat::Pretty,
    }
}

pub fn create_test_app() -> Router {
    init_tracing();
    let app_state =
        Arc::new(AppState::new(test_config()).expect("Failed to initialize test app state"));
    create_router(app_state)
}

/// Serves the dev backend on an ephemeral port and returns its base URL.
pub async fn spawn_dev_backend() -> String {
    let app = create_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Reads the answer id out of a dev backend token without checking the signature.
pub fn answer_in_token(token: &Token) -> String {
    let (encoded, _) = token.as_str().split_once('.').expect("token has a signature");
    let body = URL_SAFE_NO_PAD.decode(encoded).expect("token payload is base64");
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    payload["answer_id"].as_str().unwrap().to_string()
}

pub fn config(mode: GameMode, difficulty: u8) -> RoundConfig {
    RoundConfig::new(mode, Difficulty::new(difficulty).unwrap())
}

/// A subject question whose options are `101`, `102`, ... labelled `Subject 101`, ...
pub fn question(token: &str, option_count: usize) -> Question {
    Question {
        token: Token::new(token),
        question_type: QuestionType::IdentifySubject,
        prompt: "Who is this?".to_string(),
        image_url: Some(format!("https://img.example/{}.jpg", token)),
        options: (0..option_count)
            .map(|i| QuestionOption {
                id: (101 + i).to_string(),
                label: format!("Subject {}", 101 + i),
            })
            .collect(),
    }
}

pub fn verdict(correct: bool, answer_id: &str) -> GuessResult {
    GuessResult {
        correct,
        answer_id: answer_id.to_string(),
    }
}

pub fn board(scores: &[u32]) -> Leaderboard {
    Leaderboard::new(
        scores
            .iter()
            .map(|score| HighScoreEntry::new("AAA", *score))
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSubmission {
    pub score: u32,
    pub initials: String,
    pub config: RoundConfig,
}

/// In-memory backend. Every issued question's correct answer is option `101`.
#[derive(Default)]
pub struct ScriptedBackend {
    issued: Mutex<u64>,
    failing_questions: Mutex<VecDeque<GameError>>,
    guess_delay: Mutex<Option<Duration>>,
    used_tokens: Mutex<Vec<Token>>,
    boards: Mutex<HashMap<RoundConfig, Vec<HighScoreEntry>>>,
    submissions: Mutex<Vec<RecordedSubmission>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_board(self: Arc<Self>, config: RoundConfig, scores: &[u32]) -> Arc<Self> {
        self.boards
            .lock()
            .unwrap()
            .insert(config, board(scores).into_entries());
        self
    }

    pub fn fail_next_question(&self, err: GameError) {
        self.failing_questions.lock().unwrap().push_back(err);
    }

    pub fn delay_guesses(&self, delay: Duration) {
        *self.guess_delay.lock().unwrap() = Some(delay);
    }

    pub fn questions_issued(&self) -> u64 {
        *self.issued.lock().unwrap()
    }

    pub fn guesses(&self) -> Vec<Token> {
        self.used_tokens.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TriviaBackend for ScriptedBackend {
    async fn fetch_question(&self, config: RoundConfig) -> Result<Question, GameError> {
        if let Some(err) = self.failing_questions.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut issued = self.issued.lock().unwrap();
        *issued += 1;
        Ok(question(
            &format!("tok-{}", *issued),
            config.difficulty.option_count(),
        ))
    }

    async fn submit_guess(&self, token: &Token, option_id: &str) -> Result<GuessResult, GameError> {
        let delay = *self.guess_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.used_tokens.lock().unwrap().push(token.clone());
        Ok(verdict(option_id == "101", "101"))
    }

    async fn fetch_high_scores(&self, config: RoundConfig) -> Result<Leaderboard, GameError> {
        let boards = self.boards.lock().unwrap();
        Ok(Leaderboard::new(boards.get(&config).cloned().unwrap_or_default()))
    }

    async fn submit_high_score(
        &self,
        score: u32,
        initials: &Initials,
        config: RoundConfig,
    ) -> Result<Leaderboard, GameError> {
        self.submissions.lock().unwrap().push(RecordedSubmission {
            score,
            initials: initials.as_str().to_string(),
            config,
        });
        let mut boards = self.boards.lock().unwrap();
        let board = boards.entry(config).or_default();
        *board = merge_entry(board, HighScoreEntry::new(initials.as_str(), score));
        Ok(Leaderboard::new(board.clone()))
    }
}
