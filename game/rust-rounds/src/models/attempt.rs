use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::question::QuestionType;

/// One resolved guess, kept for the session log display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub label: String,
    pub question_type: QuestionType,
    pub correct: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(label: impl Into<String>, question_type: QuestionType, correct: bool) -> Self {
        Self {
            label: label.into(),
            question_type,
            correct,
            recorded_at: Utc::now(),
        }
    }
}
