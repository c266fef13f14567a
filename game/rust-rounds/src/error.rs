use thiserror::Error;

/// Failures the round runner distinguishes. None of them is fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Network error or non-success status from any backend call.
    #[error("{endpoint} request failed: {reason}")]
    FetchFailure {
        endpoint: &'static str,
        /// HTTP status when the backend answered with a non-success code.
        status: Option<u16>,
        reason: String,
    },

    /// The player declined to enter an identifier for a qualifying run.
    #[error("identifier entry cancelled")]
    SolicitationCancelled,

    /// A guess, clock or network event arrived for a token that is no longer current.
    #[error("event refers to a superseded round")]
    StaleEvent,

    #[error("invalid round configuration: {0}")]
    InvalidConfig(String),
}

impl GameError {
    pub fn fetch(endpoint: &'static str, reason: impl ToString) -> Self {
        GameError::FetchFailure {
            endpoint,
            status: None,
            reason: reason.to_string(),
        }
    }

    /// A non-success response. The status stays available for retry decisions.
    pub fn status(endpoint: &'static str, status: u16, reason: impl ToString) -> Self {
        GameError::FetchFailure {
            endpoint,
            status: Some(status),
            reason: reason.to_string(),
        }
    }

    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, GameError::FetchFailure { .. })
    }
}
