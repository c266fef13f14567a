use std::collections::VecDeque;

use crate::models::AttemptRecord;

/// Number of attempts kept for display.
pub const SESSION_LOG_CAPACITY: usize = 15;

/// Bounded record of recent attempts; the oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct SessionLog {
    entries: VecDeque<AttemptRecord>,
    capacity: usize,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::with_capacity(SESSION_LOG_CAPACITY)
    }
}

impl SessionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: AttemptRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    /// Most recent first.
    pub fn recent(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
