use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-category totals with the live mean difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub accuracy: f64,
    pub avg_difficulty: f64,
}

/// Category report merged with this session's average answer time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    #[serde(flatten)]
    pub report: CategoryReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_time: Option<f64>,
}

/// Session-level throughput and streak metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Seconds since the round started.
    pub duration: f64,
    pub questions_per_minute: f64,
    pub accuracy: f64,
    pub streak: u32,
    pub best_streak: u32,
}

/// Bank-wide difficulty histogram.
///
/// easy: `d <= 2`, medium: `2 < d <= 4`, hard: `d > 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DifficultyDistribution {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyDistribution {
    pub(crate) fn add(&mut self, difficulty: f64) {
        if difficulty <= 2.0 {
            self.easy += 1;
        } else if difficulty <= 4.0 {
            self.medium += 1;
        } else {
            self.hard += 1;
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}

/// Everything the statistics view shows after (or during) a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub category_performance: BTreeMap<String, CategoryPerformance>,
    pub session_stats: SessionMetrics,
    pub difficulty_distribution: DifficultyDistribution,
}
