use serde::{Deserialize, Serialize};

/// A catalog entry the dev backend builds questions from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Grouping used to pick plausible distractors (same cohort first).
    #[serde(default)]
    pub cohort: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}
