use std::collections::HashMap;
use tokio::sync::RwLock;

use super::leaderboard_service::merge_entry;
use crate::models::{HighScoreEntry, RoundConfig};

/// In-memory leaderboards for the dev backend, one per (mode, difficulty).
#[derive(Default)]
pub struct HighScoreStore {
    boards: RwLock<HashMap<RoundConfig, Vec<HighScoreEntry>>>,
}

impl HighScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self, config: RoundConfig) -> Vec<HighScoreEntry> {
        self.boards
            .read()
            .await
            .get(&config)
            .cloned()
            .unwrap_or_default()
    }

    /// Merges `entry` and returns the resulting board.
    pub async fn submit(&self, config: RoundConfig, entry: HighScoreEntry) -> Vec<HighScoreEntry> {
        let mut boards = self.boards.write().await;
        let board = boards.entry(config).or_default();
        *board = merge_entry(board, entry);

        tracing::info!(%config, entries = board.len(), "leaderboard updated");
        board.clone()
    }
}
