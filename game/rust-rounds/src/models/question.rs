use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-use authorization for exactly one guess against one issued question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are long signed blobs; a prefix is enough to correlate logs.
        let shown: String = self.0.chars().take(12).collect();
        write!(f, "{}…", shown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    IdentifySubject,
    IdentifyCategory,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::IdentifySubject => "identify-subject",
            QuestionType::IdentifyCategory => "identify-category",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub token: Token,
    pub question_type: QuestionType,
    pub prompt: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn option(&self, id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.id == id)
    }

    pub fn has_option(&self, id: &str) -> bool {
        self.option(id).is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessRequest {
    pub token: Token,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessResult {
    pub correct: bool,
    pub answer_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_deserializes_backend_payload() {
        let payload = serde_json::json!({
            "token": "abc.def",
            "question_type": "identify-category",
            "prompt": "Which party?",
            "image_url": "https://example.org/1.jpg",
            "options": [{"id": "a", "label": "A"}, {"id": "b", "label": "B"}]
        });

        let question: Question = serde_json::from_value(payload).unwrap();
        assert_eq!(question.token.as_str(), "abc.def");
        assert_eq!(question.question_type, QuestionType::IdentifyCategory);
        assert!(question.has_option("b"));
        assert!(!question.has_option("c"));
    }

    #[test]
    fn token_display_is_truncated() {
        let token = Token::new("0123456789abcdefghij");
        assert_eq!(token.to_string(), "0123456789ab…");
    }
}
