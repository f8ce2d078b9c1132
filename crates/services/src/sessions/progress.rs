/// Where a round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Questions remain in the pending queue.
    InRound,
    /// Pending is empty; skipped questions are served for review.
    Reviewing,
    /// Nothing pending and nothing skipped.
    RoundComplete,
}

/// Aggregated view of round progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundProgress {
    /// 1-based number of the question being shown ("Question 3/50").
    pub position: usize,
    /// Questions selected for this round.
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub deferred: usize,
    pub state: RoundState,
}

/// End-of-round tally.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub correct: u32,
    pub wrong: u32,
    pub skipped: u32,
    pub accuracy: f64,
    pub best_streak: u32,
}
