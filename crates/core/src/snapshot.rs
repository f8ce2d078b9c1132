//! Persisted learning-state layout and the bank's export/import.
//!
//! ```json
//! {
//!   "states": { "1": { "difficulty": 1.0, "times_shown": 0, ..., "last_seen": null } },
//!   "category_stats": { "greetings": { "total_attempts": 0, "correct_attempts": 0 } },
//!   "timestamp": "2023-11-14T22:13:20.000000Z"
//! }
//! ```

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::{QuestionBank, fresh_category_stats};
use crate::model::{
    CategoryStats, LearningState, MIN_DIFFICULTY, QuestionId, QuestionSet, RECENT_ATTEMPTS,
    SessionReport,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A snapshot that cannot be applied to a question set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Parse(String),

    #[error("snapshot question id {0:?} is not an integer")]
    InvalidId(String),

    #[error("question {id}: invalid timestamp {raw:?}")]
    InvalidTimestamp { id: QuestionId, raw: String },

    #[error("question {id}: {reason}")]
    InvalidState { id: QuestionId, reason: String },

    #[error("category {category:?}: correct attempts exceed total attempts")]
    InvalidCategoryStats { category: String },
}

//
// ─── SNAPSHOT TYPES ────────────────────────────────────────────────────────────
//

/// Persisted learning state of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub difficulty: f64,
    pub times_shown: u32,
    pub times_correct: u32,
    pub consecutive_wrong: u32,
    pub last_5_attempts: Vec<bool>,
    pub mastery_level: f64,
    pub last_seen: Option<String>,
    #[serde(default)]
    pub response_times: Vec<f64>,
}

/// Whole-bank learning state, keyed by question id as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub states: BTreeMap<String, StateSnapshot>,
    #[serde(default)]
    pub category_stats: Option<BTreeMap<String, CategoryStats>>,
    #[serde(default)]
    pub timestamp: String,
}

impl BankSnapshot {
    /// # Errors
    ///
    /// Returns `SnapshotError::Parse` for invalid JSON or a missing `states` map.
    pub fn from_json_str(raw: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(raw).map_err(|e| SnapshotError::Parse(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `SnapshotError::Parse` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Parse(e.to_string()))
    }

    /// When the snapshot was exported, if the timestamp is readable.
    #[must_use]
    pub fn exported_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Saved progress: bank state plus the statistics shown at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressDocument {
    pub bank_state: BankSnapshot,
    #[serde(default)]
    pub session_stats: Option<SessionReport>,
}

impl ProgressDocument {
    /// # Errors
    ///
    /// Returns `SnapshotError::Parse` for invalid JSON or a missing `bank_state`.
    pub fn from_json_str(raw: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(raw).map_err(|e| SnapshotError::Parse(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `SnapshotError::Parse` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Parse(e.to_string()))
    }
}

//
// ─── TIMESTAMPS ────────────────────────────────────────────────────────────────
//

#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

//
// ─── EXPORT / IMPORT ───────────────────────────────────────────────────────────
//

impl StateSnapshot {
    fn from_state(state: &LearningState) -> Self {
        Self {
            difficulty: state.difficulty(),
            times_shown: state.times_shown(),
            times_correct: state.times_correct(),
            consecutive_wrong: state.consecutive_wrong(),
            last_5_attempts: state.last_attempts().iter().copied().collect(),
            mastery_level: state.mastery_level(),
            last_seen: state.last_seen().map(format_timestamp),
            response_times: state.response_times().to_vec(),
        }
    }

    fn to_state(&self, id: QuestionId, category: &str) -> Result<LearningState, SnapshotError> {
        let invalid = |reason: &str| SnapshotError::InvalidState {
            id,
            reason: reason.to_owned(),
        };

        if !self.difficulty.is_finite() || self.difficulty < MIN_DIFFICULTY {
            return Err(invalid("difficulty must be a finite value >= 1"));
        }
        if !(0.0..=1.0).contains(&self.mastery_level) {
            return Err(invalid("mastery level must be within [0, 1]"));
        }
        if self.times_correct > self.times_shown {
            return Err(invalid("times_correct exceeds times_shown"));
        }
        if self.last_5_attempts.len() > RECENT_ATTEMPTS {
            return Err(invalid("more than 5 recent attempts"));
        }
        if self.response_times.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(invalid("response times must be finite and non-negative"));
        }

        let last_seen = match &self.last_seen {
            None => None,
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                SnapshotError::InvalidTimestamp {
                    id,
                    raw: raw.clone(),
                }
            })?),
        };

        Ok(LearningState::from_persisted(
            category.to_owned(),
            self.difficulty,
            self.times_shown,
            self.times_correct,
            self.consecutive_wrong,
            self.last_5_attempts.iter().copied().collect::<VecDeque<_>>(),
            self.response_times.clone(),
            last_seen,
            self.mastery_level,
        ))
    }
}

impl QuestionBank {
    /// Snapshot every question's state plus the category counters.
    #[must_use]
    pub fn export_state(&self, now: DateTime<Utc>) -> BankSnapshot {
        BankSnapshot {
            states: self
                .states()
                .map(|(id, state)| (id.to_string(), StateSnapshot::from_state(state)))
                .collect(),
            category_stats: Some(self.category_stats().clone()),
            timestamp: format_timestamp(now),
        }
    }

    /// Rebuild a bank for `questions` from a snapshot.
    ///
    /// Snapshot ids missing from `questions` are ignored; questions missing from
    /// the snapshot keep default state. Snapshot category counters replace the
    /// fresh ones, and categories they lack start at zero.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` for non-integer ids, unreadable timestamps or
    /// states that break learning-state invariants. Nothing is built on error.
    pub fn import_state(
        questions: QuestionSet,
        snapshot: &BankSnapshot,
    ) -> Result<Self, SnapshotError> {
        let mut states: BTreeMap<QuestionId, LearningState> = questions
            .iter()
            .map(|q| (q.id(), LearningState::new(q.category())))
            .collect();

        let mut ignored = 0_usize;
        for (raw_id, snap) in &snapshot.states {
            let id: QuestionId = raw_id
                .parse()
                .map_err(|_| SnapshotError::InvalidId(raw_id.clone()))?;
            let Some(question) = questions.get(id) else {
                ignored += 1;
                continue;
            };
            states.insert(id, snap.to_state(id, question.category())?);
        }
        if ignored > 0 {
            tracing::warn!(ignored, "snapshot ids not present in the question set were ignored");
        }

        let mut category_stats = fresh_category_stats(&questions);
        if let Some(saved) = &snapshot.category_stats {
            for (category, stats) in saved {
                if stats.correct_attempts > stats.total_attempts {
                    return Err(SnapshotError::InvalidCategoryStats {
                        category: category.clone(),
                    });
                }
                category_stats.insert(category.clone(), *stats);
            }
        }

        Ok(QuestionBank::from_parts(questions, states, category_stats))
    }
}
