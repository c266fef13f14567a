/// Consecutive correct answers within one session. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct StreakTracker {
    current: u32,
    best: u32,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Longest streak seen this session, for display only.
    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn on_correct(&mut self) -> u32 {
        self.current = self.current.saturating_add(1);
        self.best = self.best.max(self.current);
        self.current
    }

    /// Ends the run and returns its score.
    pub fn on_incorrect(&mut self) -> u32 {
        self.finish_run()
    }

    /// Ends the run and returns its score.
    pub fn on_timeout(&mut self) -> u32 {
        self.finish_run()
    }

    /// Drops the current streak without ending a run (configuration change).
    pub fn discard(&mut self) {
        self.current = 0;
    }

    fn finish_run(&mut self) -> u32 {
        std::mem::take(&mut self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answers_extend_the_streak_by_one() {
        let mut streak = StreakTracker::new();
        assert_eq!(streak.on_correct(), 1);
        assert_eq!(streak.on_correct(), 2);
        assert_eq!(streak.current(), 2);
    }

    #[test]
    fn incorrect_and_timeout_reset_to_zero_and_report_the_run() {
        let mut streak = StreakTracker::new();
        streak.on_correct();
        streak.on_correct();
        streak.on_correct();
        assert_eq!(streak.on_incorrect(), 3);
        assert_eq!(streak.current(), 0);

        streak.on_correct();
        assert_eq!(streak.on_timeout(), 1);
        assert_eq!(streak.current(), 0);
        assert_eq!(streak.on_timeout(), 0);
        assert_eq!(streak.best(), 3);
    }

    #[test]
    fn discard_keeps_best() {
        let mut streak = StreakTracker::new();
        streak.on_correct();
        streak.discard();
        assert_eq!(streak.current(), 0);
        assert_eq!(streak.best(), 1);
    }
}
