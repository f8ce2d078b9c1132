//! Priority scoring for question selection.
//!
//! Every function here is pure: it reads a state or bank snapshot at an explicit
//! `now` and never mutates anything. Scores only rank questions for selection;
//! mastery and difficulty updates live in [`LearningState`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::bank::QuestionBank;
use crate::model::{LearningState, QuestionId, RECENT_ATTEMPTS};

/// Days over which a mastered question fades.
const DECAY_HORIZON_DAYS: f64 = 30.0;

/// Early window of the last five attempts; the rest is the late window.
const EARLY_WINDOW: usize = 3;
const DEGRADING_FACTOR: f64 = 1.5;
const IMPROVING_FACTOR: f64 = 0.8;

/// Number of most recent response times averaged for the speed factor.
const SPEED_WINDOW: usize = 5;
const SPEED_BASELINE_SECS: f64 = 5.0;
const MAX_SPEED_FACTOR: f64 = 2.0;

/// Weight of the question's own pattern score in the composite.
pub const INDIVIDUAL_WEIGHT: f64 = 0.7;
/// Weight of the category's mean difficulty in the composite.
pub const CATEGORY_WEIGHT: f64 = 0.3;

/// Time-based forgetting factor in `(0, 1]`.
///
/// Returns 1.0 for never-seen questions. Whole elapsed days are used and a
/// `last_seen` in the future counts as zero days.
#[must_use]
pub fn decay(state: &LearningState, now: DateTime<Utc>) -> f64 {
    let Some(last_seen) = state.last_seen() else {
        return 1.0;
    };
    let days = now.signed_duration_since(last_seen).num_days().max(0);
    #[allow(clippy::cast_precision_loss)]
    let days = days as f64;
    1.0 - state.mastery_level() * (1.0 - (-days / DECAY_HORIZON_DAYS).exp())
}

/// Difficulty adjusted by recent trend, answer speed and decay.
#[must_use]
pub fn pattern_score(state: &LearningState, now: DateTime<Utc>) -> f64 {
    let mut score = state.difficulty();

    let attempts = state.last_attempts();
    if attempts.len() >= RECENT_ATTEMPTS {
        let recent: Vec<bool> = attempts
            .iter()
            .skip(attempts.len() - RECENT_ATTEMPTS)
            .copied()
            .collect();
        let (early, late) = recent.split_at(EARLY_WINDOW);
        let early_correct = early.iter().filter(|hit| **hit).count();
        let late_correct = late.iter().filter(|hit| **hit).count();

        if early_correct > late_correct {
            score *= DEGRADING_FACTOR;
        } else if early_correct < late_correct {
            score *= IMPROVING_FACTOR;
        }
    }

    let times = state.response_times();
    if !times.is_empty() {
        let recent = &times[times.len().saturating_sub(SPEED_WINDOW)..];
        #[allow(clippy::cast_precision_loss)]
        let avg = recent.iter().sum::<f64>() / recent.len() as f64;
        score *= (avg / SPEED_BASELINE_SECS).min(MAX_SPEED_FACTOR);
    }

    score * decay(state, now)
}

/// Mean difficulty of the category's questions; 1.0 when it has none.
#[must_use]
pub fn category_difficulty(bank: &QuestionBank, category: &str) -> f64 {
    let (sum, count) = bank
        .states()
        .filter(|(_, state)| state.category() == category)
        .fold((0.0, 0_u32), |(sum, count), (_, state)| {
            (sum + state.difficulty(), count + 1)
        });
    if count == 0 {
        1.0
    } else {
        sum / f64::from(count)
    }
}

/// Ranking score: `0.7 * pattern_score + 0.3 * category_difficulty`.
///
/// Returns `None` for ids outside the bank.
#[must_use]
pub fn composite_score(bank: &QuestionBank, id: QuestionId, now: DateTime<Utc>) -> Option<f64> {
    let state = bank.state(id)?;
    Some(blend(
        pattern_score(state, now),
        category_difficulty(bank, state.category()),
    ))
}

/// Composite scores for the whole bank, computing each category mean once.
pub(crate) fn composite_scores(
    bank: &QuestionBank,
    now: DateTime<Utc>,
) -> Vec<(QuestionId, f64)> {
    let mut category_means: BTreeMap<&str, f64> = BTreeMap::new();
    for category in bank.questions().categories() {
        category_means.insert(category, category_difficulty(bank, category));
    }

    bank.states()
        .map(|(id, state)| {
            let category = category_means
                .get(state.category())
                .copied()
                .unwrap_or(1.0);
            (id, blend(pattern_score(state, now), category))
        })
        .collect()
}

fn blend(pattern: f64, category: f64) -> f64 {
    INDIVIDUAL_WEIGHT * pattern + CATEGORY_WEIGHT * category
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn answered(pattern: &[bool], secs: f64) -> LearningState {
        let mut state = LearningState::new("x");
        for hit in pattern {
            state.record_answer(*hit, secs, fixed_now());
        }
        state
    }

    #[test]
    fn decay_is_one_for_unseen_questions() {
        let state = LearningState::new("x");
        assert_eq!(decay(&state, fixed_now()), 1.0);
    }

    #[test]
    fn decay_drops_below_one_for_mastered_questions_over_time() {
        let state = answered(&[true, true, true], 5.0);
        assert_eq!(decay(&state, fixed_now()), 1.0);
        let later = fixed_now() + Duration::days(10);
        let d = decay(&state, later);
        assert!(d < 1.0 && d > 0.0);
        let expected = 1.0 - state.mastery_level() * (1.0 - (-10.0_f64 / 30.0).exp());
        assert!((d - expected).abs() < 1e-12);
    }

    #[test]
    fn decay_ignores_future_last_seen() {
        let state = answered(&[true], 5.0);
        assert_eq!(decay(&state, fixed_now() - Duration::days(3)), 1.0);
    }

    #[test]
    fn pattern_score_without_history_is_difficulty() {
        let state = LearningState::new("x");
        assert_eq!(pattern_score(&state, fixed_now()), 1.0);
    }

    #[test]
    fn speed_factor_scales_by_average_time() {
        // one correct answer at 5s keeps speed factor 1.0; difficulty floors at 1.0
        let state = answered(&[true], 5.0);
        assert!((pattern_score(&state, fixed_now()) - 1.0).abs() < 1e-12);

        // very slow answers cap the factor at 2.0
        let slow = answered(&[true], 60.0);
        assert!((pattern_score(&slow, fixed_now()) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degrading_trend_inflates_and_improving_trend_deflates() {
        let degrading = answered(&[true, true, true, false, false], 5.0);
        let base = degrading.difficulty();
        assert!((pattern_score(&degrading, fixed_now()) - base * 1.5).abs() < 1e-9);

        let improving = answered(&[false, false, false, true, true], 5.0);
        let base = improving.difficulty();
        assert!((pattern_score(&improving, fixed_now()) - base * 0.8).abs() < 1e-9);

        // 2 early hits vs 2 late hits: no trend adjustment
        let flat = answered(&[true, false, true, true, true], 5.0);
        let base = flat.difficulty();
        assert!((pattern_score(&flat, fixed_now()) - base).abs() < 1e-9);
    }

    #[test]
    fn category_difficulty_defaults_to_one() {
        let bank = QuestionBank::new(fixtures::set(&[(1, "a")]));
        assert_eq!(category_difficulty(&bank, "missing"), 1.0);
        assert_eq!(category_difficulty(&bank, "a"), 1.0);
    }

    #[test]
    fn composite_blends_individual_and_category() {
        let mut bank = QuestionBank::new(fixtures::set(&[(1, "a"), (2, "a")]));
        bank.update_question_state(QuestionId::new(1), false, 5.0, fixed_now())
            .unwrap();
        // q1 difficulty = 4.0, q2 = 1.0, category mean = 2.5
        let score = composite_score(&bank, QuestionId::new(1), fixed_now()).unwrap();
        assert!((score - (0.7 * 4.0 + 0.3 * 2.5)).abs() < 1e-12);
        assert!(composite_score(&bank, QuestionId::new(99), fixed_now()).is_none());

        let all = composite_scores(&bank, fixed_now());
        assert_eq!(all.len(), 2);
        assert!((all[0].1 - score).abs() < 1e-12);
    }
}
