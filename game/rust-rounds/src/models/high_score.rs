use serde::{Deserialize, Serialize};
use validator::Validate;

use super::round_config::{Difficulty, GameMode, RoundConfig};

/// Maximum number of entries a leaderboard keeps.
pub const LEADERBOARD_CAPACITY: usize = 10;

/// Maximum identifier length a player can enter.
pub const MAX_INITIALS_LEN: usize = 3;

/// Placeholder suggested when a leaderboard has no entries yet.
pub const DEFAULT_INITIALS: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub initials: String,
    pub score: u32,
}

impl HighScoreEntry {
    pub fn new(initials: impl Into<String>, score: u32) -> Self {
        Self {
            initials: initials.into(),
            score,
        }
    }
}

/// Player identifier accepted for a leaderboard entry: 1-3 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initials(String);

impl Initials {
    /// Trims the input and keeps at most three characters.
    /// Returns `None` for empty input, which cancels the submission.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed: String = input.trim().chars().take(MAX_INITIALS_LEN).collect();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ranked entries for one (mode, difficulty) partition, as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard(Vec<HighScoreEntry>);

impl Leaderboard {
    pub fn new(entries: Vec<HighScoreEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= LEADERBOARD_CAPACITY
    }

    /// Lowest score that still gets a run onto this board.
    ///
    /// 0 while the board has free slots, otherwise the score of the last ranked entry.
    pub fn admission_threshold(&self) -> u32 {
        if !self.is_full() {
            return 0;
        }
        self.0
            .get(LEADERBOARD_CAPACITY - 1)
            .map(|entry| entry.score)
            .unwrap_or(0)
    }

    /// Initials suggested to the player when soliciting an identifier.
    pub fn suggested_initials(&self) -> String {
        self.0
            .first()
            .map(|entry| entry.initials.clone())
            .unwrap_or_else(|| DEFAULT_INITIALS.to_string())
    }

    pub fn into_entries(self) -> Vec<HighScoreEntry> {
        self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScoresResponse {
    pub high_scores: Vec<HighScoreEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitHighScoreRequest {
    pub score: u32,
    #[validate(length(min = 1, max = 3, message = "initials must be 1-3 characters"))]
    pub initials: String,
    pub game: GameMode,
    #[validate(range(min = 2, max = 6, message = "difficulty must be between 2 and 6"))]
    pub difficulty: u8,
}

impl SubmitHighScoreRequest {
    pub fn new(score: u32, initials: &Initials, config: RoundConfig) -> Self {
        Self {
            score,
            initials: initials.as_str().to_string(),
            game: config.game_mode,
            difficulty: config.difficulty.into(),
        }
    }

    /// Partition this submission targets, once the body has passed validation.
    pub fn round_config(&self) -> Option<RoundConfig> {
        Difficulty::new(self.difficulty)
            .ok()
            .map(|difficulty| RoundConfig::new(self.game, difficulty))
    }
}
