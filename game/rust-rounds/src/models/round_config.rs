use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GameError;

/// Which question stream a round draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    IdentifySubject,
    IdentifyCategory,
    Mixed,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [
        GameMode::IdentifySubject,
        GameMode::IdentifyCategory,
        GameMode::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::IdentifySubject => "identify-subject",
            GameMode::IdentifyCategory => "identify-category",
            GameMode::Mixed => "mixed",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| GameError::InvalidConfig(format!("unknown game mode '{}'", s)))
    }
}

/// Number of options per question, which is also the leaderboard tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 2;
    pub const MAX: u8 = 6;

    pub fn new(value: u8) -> Result<Self, GameError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(GameError::InvalidConfig(format!(
                "difficulty must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn option_count(&self) -> usize {
        self.0 as usize
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(4)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Difficulty::new(value)
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u8>()
            .map_err(|_| GameError::InvalidConfig(format!("difficulty '{}' is not a number", s)))?;
        Difficulty::new(value)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The active (mode, difficulty) pair. Also the leaderboard partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundConfig {
    pub game_mode: GameMode,
    pub difficulty: Difficulty,
}

impl RoundConfig {
    pub fn new(game_mode: GameMode, difficulty: Difficulty) -> Self {
        Self {
            game_mode,
            difficulty,
        }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::new(GameMode::IdentifySubject, Difficulty::default())
    }
}

impl fmt::Display for RoundConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.game_mode, self.difficulty)
    }
}

/// Query string shared by `GET question` and `GET high-scores`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PartitionQuery {
    pub game: GameMode,
    pub difficulty: Difficulty,
}

impl From<RoundConfig> for PartitionQuery {
    fn from(config: RoundConfig) -> Self {
        Self {
            game: config.game_mode,
            difficulty: config.difficulty,
        }
    }
}

impl From<PartitionQuery> for RoundConfig {
    fn from(query: PartitionQuery) -> Self {
        RoundConfig::new(query.game, query.difficulty)
    }
}
