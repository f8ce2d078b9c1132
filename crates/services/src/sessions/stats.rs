use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Counters and timers for the current round. Reset by every `start_round`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    correct: u32,
    wrong: u32,
    skipped: u32,
    streak: u32,
    best_streak: u32,
    started_at: DateTime<Utc>,
    question_started_at: DateTime<Utc>,
    times_per_category: BTreeMap<String, Vec<f64>>,
}

impl SessionStats {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            correct: 0,
            wrong: 0,
            skipped: 0,
            streak: 0,
            best_streak: 0,
            started_at: now,
            question_started_at: now,
            times_per_category: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    #[must_use]
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn question_started_at(&self) -> DateTime<Utc> {
        self.question_started_at
    }

    /// Answer times recorded this round, per category.
    #[must_use]
    pub fn times_per_category(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.times_per_category
    }

    /// Correct plus wrong; skips are not answers.
    #[must_use]
    pub fn answered(&self) -> u32 {
        self.correct + self.wrong
    }

    /// Round accuracy over answered questions; 0 before the first answer.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let answered = self.answered();
        if answered == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(answered)
        }
    }

    /// Mean answer time for `category` this round.
    #[must_use]
    pub fn average_time(&self, category: &str) -> Option<f64> {
        let times = self.times_per_category.get(category)?;
        if times.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        Some(avg)
    }

    pub(crate) fn record_answer(
        &mut self,
        category: &str,
        correct: bool,
        elapsed: f64,
        now: DateTime<Utc>,
    ) {
        self.times_per_category
            .entry(category.to_owned())
            .or_default()
            .push(elapsed);

        if correct {
            self.correct += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.wrong += 1;
            self.streak = 0;
        }
        self.question_started_at = now;
    }

    pub(crate) fn record_skip(&mut self, now: DateTime<Utc>) {
        self.skipped += 1;
        self.question_started_at = now;
    }
}
