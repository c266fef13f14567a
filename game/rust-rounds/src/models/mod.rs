pub mod attempt;
pub mod high_score;
pub mod question;
pub mod round_config;
pub mod subject;
pub mod timer;

pub use attempt::AttemptRecord;
pub use high_score::{
    HighScoreEntry, HighScoresResponse, Initials, Leaderboard, SubmitHighScoreRequest,
    LEADERBOARD_CAPACITY,
};
pub use question::{GuessRequest, GuessResult, Question, QuestionOption, QuestionType, Token};
pub use round_config::{Difficulty, GameMode, PartitionQuery, RoundConfig};
pub use subject::Subject;
pub use timer::{ClockEvent, ClockGeneration};
