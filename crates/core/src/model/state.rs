use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of most recent attempts kept for pattern analysis.
pub const RECENT_ATTEMPTS: usize = 5;

/// Floor for `difficulty`; new questions start here.
pub const MIN_DIFFICULTY: f64 = 1.0;

const MASTERY_GAIN: f64 = 0.1;
const MASTERY_LOSS: f64 = 0.2;
const DIFFICULTY_RELIEF: f64 = 0.8;
const MISS_PENALTY: f64 = 2.0;
const STREAK_PENALTY_STEP: f64 = 0.5;

//
// ─── DIFFICULTY TIER ───────────────────────────────────────────────────────────
//

/// Coarse difficulty indicator shown next to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyTier {
    /// difficulty <= 3
    Cool,
    /// 3 < difficulty <= 5
    Warm,
    /// difficulty > 5
    Hot,
}

impl DifficultyTier {
    #[must_use]
    pub fn from_difficulty(difficulty: f64) -> Self {
        if difficulty > 5.0 {
            Self::Hot
        } else if difficulty > 3.0 {
            Self::Warm
        } else {
            Self::Cool
        }
    }
}

//
// ─── LEARNING STATE ────────────────────────────────────────────────────────────
//

/// Mutable learning state for one question.
///
/// Only `QuestionBank` mutates it; callers get shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningState {
    difficulty: f64,
    times_shown: u32,
    times_correct: u32,
    consecutive_wrong: u32,
    last_attempts: VecDeque<bool>,
    response_times: Vec<f64>,
    last_seen: Option<DateTime<Utc>>,
    mastery_level: f64,
    category: String,
}

impl LearningState {
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            difficulty: MIN_DIFFICULTY,
            times_shown: 0,
            times_correct: 0,
            consecutive_wrong: 0,
            last_attempts: VecDeque::with_capacity(RECENT_ATTEMPTS + 1),
            response_times: Vec::new(),
            last_seen: None,
            mastery_level: 0.0,
            category: category.into(),
        }
    }

    /// Rebuild a state from persisted fields. Callers validate invariants first.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_persisted(
        category: String,
        difficulty: f64,
        times_shown: u32,
        times_correct: u32,
        consecutive_wrong: u32,
        last_attempts: VecDeque<bool>,
        response_times: Vec<f64>,
        last_seen: Option<DateTime<Utc>>,
        mastery_level: f64,
    ) -> Self {
        Self {
            difficulty,
            times_shown,
            times_correct,
            consecutive_wrong,
            last_attempts,
            response_times,
            last_seen,
            mastery_level,
            category,
        }
    }

    #[must_use]
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    #[must_use]
    pub fn times_shown(&self) -> u32 {
        self.times_shown
    }

    #[must_use]
    pub fn times_correct(&self) -> u32 {
        self.times_correct
    }

    #[must_use]
    pub fn consecutive_wrong(&self) -> u32 {
        self.consecutive_wrong
    }

    /// Up to the last five outcomes, oldest first.
    #[must_use]
    pub fn last_attempts(&self) -> &VecDeque<bool> {
        &self.last_attempts
    }

    /// Every recorded answer time in seconds, oldest first.
    #[must_use]
    pub fn response_times(&self) -> &[f64] {
        &self.response_times
    }

    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    #[must_use]
    pub fn mastery_level(&self) -> f64 {
        self.mastery_level
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn is_untested(&self) -> bool {
        self.times_shown == 0
    }

    /// Lifetime accuracy; 0 when never shown.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.times_correct, self.times_shown)
    }

    #[must_use]
    pub fn tier(&self) -> DifficultyTier {
        DifficultyTier::from_difficulty(self.difficulty)
    }

    pub(crate) fn record_answer(&mut self, correct: bool, time_taken: f64, now: DateTime<Utc>) {
        self.times_shown = self.times_shown.saturating_add(1);
        self.last_seen = Some(now);
        self.response_times.push(time_taken);
        self.last_attempts.push_back(correct);
        while self.last_attempts.len() > RECENT_ATTEMPTS {
            self.last_attempts.pop_front();
        }

        if correct {
            self.times_correct = self.times_correct.saturating_add(1);
            self.consecutive_wrong = 0;
            self.mastery_level = (self.mastery_level + MASTERY_GAIN).min(1.0);
            self.difficulty = (self.difficulty * DIFFICULTY_RELIEF).max(MIN_DIFFICULTY);
        } else {
            self.consecutive_wrong = self.consecutive_wrong.saturating_add(1);
            self.mastery_level = (self.mastery_level - MASTERY_LOSS).max(0.0);
            self.difficulty += MISS_PENALTY
                * (1.0 + f64::from(self.consecutive_wrong) * STREAK_PENALTY_STEP);
        }
    }
}

//
// ─── CATEGORY STATS ────────────────────────────────────────────────────────────
//

/// Accumulated answer counters for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    pub total_attempts: u32,
    pub correct_attempts: u32,
}

impl CategoryStats {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct_attempts, self.total_attempts)
    }

    pub(crate) fn record(&mut self, correct: bool) {
        self.total_attempts = self.total_attempts.saturating_add(1);
        if correct {
            self.correct_attempts = self.correct_attempts.saturating_add(1);
        }
    }
}

fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole)
    }
}
