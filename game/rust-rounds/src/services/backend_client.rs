use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::error::GameError;
use crate::metrics::track_backend_request;
use crate::models::{
    GuessRequest, GuessResult, HighScoresResponse, Initials, Leaderboard, PartitionQuery,
    Question, RoundConfig, SubmitHighScoreRequest, Token,
};
use crate::utils::retry::{retry_async, RetryPolicy};

const QUESTION_ENDPOINT: &str = "question";
const GUESS_ENDPOINT: &str = "guess";
const HIGH_SCORES_ENDPOINT: &str = "high-scores";

/// The backend collaborator: question issuance, guess checking and leaderboards.
#[async_trait]
pub trait TriviaBackend: Send + Sync {
    /// Issues a fresh question with a single-use token.
    async fn fetch_question(&self, config: RoundConfig) -> Result<Question, GameError>;

    async fn submit_guess(&self, token: &Token, option_id: &str) -> Result<GuessResult, GameError>;

    async fn fetch_high_scores(&self, config: RoundConfig) -> Result<Leaderboard, GameError>;

    /// Returns the authoritative board after the merge.
    async fn submit_high_score(
        &self,
        score: u32,
        initials: &Initials,
        config: RoundConfig,
    ) -> Result<Leaderboard, GameError>;
}

/// JSON-over-HTTP client for the backend contract.
pub struct HttpBackend {
    http_client: Client,
    base_url: Url,
    read_retry: RetryPolicy,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GameError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GameError::fetch("client", e))?;
        Self::with_client(http_client, base_url)
    }

    pub fn with_client(http_client: Client, base_url: &str) -> Result<Self, GameError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| GameError::InvalidConfig(format!("backend url '{}': {}", base_url, e)))?;
        // Relative joins below need a trailing slash to keep any path prefix.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client,
            base_url,
            read_retry: RetryPolicy::default(),
        })
    }

    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    fn endpoint(&self, endpoint: &'static str) -> Result<Url, GameError> {
        self.base_url
            .join(&format!("api/{}", endpoint))
            .map_err(|e| GameError::fetch(endpoint, e))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        config: RoundConfig,
    ) -> Result<T, GameError> {
        let url = self.endpoint(endpoint)?;
        let query = PartitionQuery::from(config);
        let (url, query) = (&url, &query);

        retry_async(&self.read_retry, is_transient, || {
            track_backend_request(endpoint, async move {
                let response = self
                    .http_client
                    .get(url.clone())
                    .query(query)
                    .send()
                    .await
                    .map_err(|e| GameError::fetch(endpoint, e))?;
                decode(endpoint, response).await
            })
        })
        .await
    }

    async fn post_json<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<T, GameError> {
        let url = self.endpoint(endpoint)?;

        track_backend_request(endpoint, async {
            let response = self
                .http_client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| GameError::fetch(endpoint, e))?;
            decode(endpoint, response).await
        })
        .await
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<T, GameError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(GameError::status(
            endpoint,
            status.as_u16(),
            status_reason(status, &body),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GameError::fetch(endpoint, format!("invalid response body: {}", e)))
}

fn status_reason(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body)
    }
}

/// Reads are retried on transport errors and 5xx only.
fn is_transient(err: &GameError) -> bool {
    match err {
        GameError::FetchFailure { status, .. } => !matches!(status, Some(400..=499)),
        _ => false,
    }
}

#[async_trait]
impl TriviaBackend for HttpBackend {
    async fn fetch_question(&self, config: RoundConfig) -> Result<Question, GameError> {
        let question: Question = self.get_json(QUESTION_ENDPOINT, config).await?;
        if question.options.is_empty() {
            return Err(GameError::fetch(QUESTION_ENDPOINT, "question has no options"));
        }
        Ok(question)
    }

    async fn submit_guess(&self, token: &Token, option_id: &str) -> Result<GuessResult, GameError> {
        let body = GuessRequest {
            token: token.clone(),
            answer: option_id.to_string(),
        };
        self.post_json(GUESS_ENDPOINT, &body).await
    }

    async fn fetch_high_scores(&self, config: RoundConfig) -> Result<Leaderboard, GameError> {
        let response: HighScoresResponse = self.get_json(HIGH_SCORES_ENDPOINT, config).await?;
        Ok(Leaderboard::new(response.high_scores))
    }

    async fn submit_high_score(
        &self,
        score: u32,
        initials: &Initials,
        config: RoundConfig,
    ) -> Result<Leaderboard, GameError> {
        let body = SubmitHighScoreRequest::new(score, initials, config);
        let response: HighScoresResponse = self.post_json(HIGH_SCORES_ENDPOINT, &body).await?;
        Ok(Leaderboard::new(response.high_scores))
    }
}
