use std::collections::HashMap;

use crate::error::GameError;
use crate::metrics::record_high_score_submission;
use crate::models::{HighScoreEntry, Initials, Leaderboard, RoundConfig, LEADERBOARD_CAPACITY};

pub type SubmissionId = u64;

/// Inserts `entry` into a ranked list and returns the new list.
///
/// Descending by score; an entry goes after existing entries with an equal score;
/// the result is capped at [`LEADERBOARD_CAPACITY`].
pub fn merge_entry(current: &[HighScoreEntry], entry: HighScoreEntry) -> Vec<HighScoreEntry> {
    let position = current
        .iter()
        .position(|existing| existing.score < entry.score)
        .unwrap_or(current.len());

    let mut merged = Vec::with_capacity(current.len() + 1);
    merged.extend_from_slice(&current[..position]);
    merged.push(entry);
    merged.extend_from_slice(&current[position..]);
    merged.truncate(LEADERBOARD_CAPACITY);
    merged
}

/// Whether a finished run is worth soliciting an identifier for.
pub fn qualifies(board: &Leaderboard, score: u32) -> bool {
    score > 0 && score >= board.admission_threshold()
}

/// Asks the player for an identifier for a qualifying run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solicitation {
    pub id: SubmissionId,
    pub score: u32,
    pub config: RoundConfig,
    pub suggested: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: SubmissionId,
    pub score: u32,
    pub initials: Initials,
    pub config: RoundConfig,
}

/// Per-configuration leaderboard cache, the open solicitation and submissions in flight.
///
/// The cache is only ever replaced by lists the backend returned; ranking and the
/// entry cap are the backend's job. A new solicitation supersedes an unanswered one
/// but never a submission already sent.
#[derive(Debug, Default)]
pub struct LeaderboardReconciler {
    boards: HashMap<RoundConfig, Leaderboard>,
    soliciting: Option<Solicitation>,
    in_flight: HashMap<SubmissionId, Submission>,
    last_submission_id: SubmissionId,
}

impl LeaderboardReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self, config: &RoundConfig) -> Option<&Leaderboard> {
        self.boards.get(config)
    }

    pub fn pending_solicitation(&self) -> Option<&Solicitation> {
        self.soliciting.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Decides whether `score` qualifies for `config`'s board and, if so, starts soliciting.
    pub fn maybe_submit(&mut self, score: u32, config: RoundConfig) -> Option<Solicitation> {
        if score == 0 {
            return None;
        }

        let empty = Leaderboard::default();
        let board = self.boards.get(&config).unwrap_or(&empty);
        if !qualifies(board, score) {
            tracing::info!(
                score,
                threshold = board.admission_threshold(),
                %config,
                "run does not qualify for leaderboard"
            );
            record_high_score_submission("not_qualified");
            return None;
        }

        self.last_submission_id += 1;
        let solicitation = Solicitation {
            id: self.last_submission_id,
            score,
            config,
            suggested: board.suggested_initials(),
        };
        if let Some(previous) = self.soliciting.replace(solicitation.clone()) {
            tracing::debug!(submission = previous.id, "superseded unanswered solicitation");
            record_high_score_submission("superseded");
        }
        Some(solicitation)
    }

    /// Handles the player's answer to a solicitation. Empty or missing input cancels.
    pub fn on_initials(
        &mut self,
        id: SubmissionId,
        input: Option<&str>,
    ) -> Result<Submission, GameError> {
        let solicitation = match self.soliciting.take() {
            Some(solicitation) if solicitation.id == id => solicitation,
            other => {
                self.soliciting = other;
                return Err(GameError::StaleEvent);
            }
        };

        let Some(initials) = input.and_then(Initials::parse) else {
            record_high_score_submission("cancelled");
            return Err(GameError::SolicitationCancelled);
        };

        let submission = Submission {
            id,
            score: solicitation.score,
            initials,
            config: solicitation.config,
        };
        self.in_flight.insert(id, submission.clone());
        Ok(submission)
    }

    /// Replaces the cached board with the backend's list, or leaves it untouched on failure.
    pub fn on_submitted(
        &mut self,
        id: SubmissionId,
        result: Result<Leaderboard, GameError>,
    ) -> Result<RoundConfig, GameError> {
        let submission = self.in_flight.remove(&id).ok_or(GameError::StaleEvent)?;

        match result {
            Ok(board) => {
                tracing::info!(
                    score = submission.score,
                    initials = submission.initials.as_str(),
                    config = %submission.config,
                    entries = board.len(),
                    "high score merged"
                );
                record_high_score_submission("merged");
                self.boards.insert(submission.config, board);
                Ok(submission.config)
            }
            Err(err) => {
                tracing::warn!(error = %err, config = %submission.config, "high score submission failed");
                record_high_score_submission("failed");
                Err(err)
            }
        }
    }

    /// Stores a fetched board. A failed fetch keeps whatever was cached.
    pub fn on_fetched(
        &mut self,
        config: RoundConfig,
        result: Result<Leaderboard, GameError>,
    ) -> Result<&Leaderboard, GameError> {
        match result {
            Ok(board) => {
                self.boards.insert(config, board);
                self.boards.get(&config).ok_or(GameError::StaleEvent)
            }
            Err(err) => {
                tracing::warn!(error = %err, %config, "leaderboard fetch failed");
                Err(err)
            }
        }
    }
}
