use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use thiserror::Error;

use crate::model::{
    CategoryReport, CategoryStats, DifficultyDistribution, LearningState, Question, QuestionId,
    QuestionSet,
};
use crate::scoring;

/// Share of a round drawn from the top-ranked questions.
const HIGH_PRIORITY_SHARE: f64 = 0.6;
/// Share of a round drawn from never-shown questions.
const UNTESTED_SHARE: f64 = 0.3;
/// Share of a round drawn from anything else.
const RANDOM_SHARE: f64 = 0.1;

/// Questions above this difficulty count towards fatigue.
const FATIGUE_DIFFICULTY: f64 = 3.0;
/// A fully fatigued bank shrinks rounds by this fraction.
const MAX_FATIGUE_SHRINK: f64 = 0.3;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question {0} is not in this bank")]
    UnknownQuestion(QuestionId),
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// Owns the questions, their learning state and category counters.
///
/// The bank is the only mutator of learning state: callers read states through
/// shared references and report outcomes via [`QuestionBank::update_question_state`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    questions: QuestionSet,
    states: BTreeMap<QuestionId, LearningState>,
    category_stats: BTreeMap<String, CategoryStats>,
}

impl QuestionBank {
    /// Fresh bank: default state for every question, zeroed category counters.
    #[must_use]
    pub fn new(questions: QuestionSet) -> Self {
        let states = questions
            .iter()
            .map(|q| (q.id(), LearningState::new(q.category())))
            .collect();
        let category_stats = fresh_category_stats(&questions);
        Self {
            questions,
            states,
            category_stats,
        }
    }

    pub(crate) fn from_parts(
        questions: QuestionSet,
        states: BTreeMap<QuestionId, LearningState>,
        category_stats: BTreeMap<String, CategoryStats>,
    ) -> Self {
        Self {
            questions,
            states,
            category_stats,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    #[must_use]
    pub fn state(&self, id: QuestionId) -> Option<&LearningState> {
        self.states.get(&id)
    }

    /// All states in ascending id order.
    pub fn states(&self) -> impl Iterator<Item = (QuestionId, &LearningState)> {
        self.states.iter().map(|(id, state)| (*id, state))
    }

    #[must_use]
    pub fn category_stats(&self) -> &BTreeMap<String, CategoryStats> {
        &self.category_stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Fraction of questions currently harder than the fatigue threshold.
    #[must_use]
    pub fn fatigue_factor(&self) -> f64 {
        if self.states.is_empty() {
            return 0.0;
        }
        let hard = self
            .states
            .values()
            .filter(|s| s.difficulty() > FATIGUE_DIFFICULTY)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let factor = hard as f64 / self.states.len() as f64;
        factor
    }

    /// Round size after shrinking for fatigue: `floor(n * (1 - 0.3 * fatigue))`.
    #[must_use]
    pub fn adjusted_round_size(&self, n: usize) -> usize {
        #[allow(clippy::cast_precision_loss)]
        let scaled = n as f64 * (1.0 - MAX_FATIGUE_SHRINK * self.fatigue_factor());
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let adjusted = scaled.floor().max(0.0) as usize;
        adjusted.min(n)
    }

    /// Select a shuffled round of up to `n` distinct ids using the thread RNG.
    #[must_use]
    pub fn select_questions(&self, n: usize) -> Vec<QuestionId> {
        self.select_questions_with(n, Utc::now(), &mut rand::rng())
    }

    /// Select a shuffled round of up to `n` distinct ids.
    ///
    /// - 60% from the highest composite scores
    /// - 30% from never-shown questions
    /// - 10% from anything not yet chosen
    /// - topped up at random when the pools run dry
    pub fn select_questions_with<R: Rng + ?Sized>(
        &self,
        n: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<QuestionId> {
        if self.states.is_empty() {
            return Vec::new();
        }
        let adjusted = self.adjusted_round_size(n);
        if adjusted == 0 {
            return Vec::new();
        }

        let mut ranked = scoring::composite_scores(self, now);
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let high_quota = quota(adjusted, HIGH_PRIORITY_SHARE);
        let untested_quota = quota(adjusted, UNTESTED_SHARE);
        let random_quota = quota(adjusted, RANDOM_SHARE);

        let mut picker = Picker::with_capacity(adjusted);

        let high_priority: Vec<QuestionId> =
            ranked.iter().take(high_quota).map(|(id, _)| *id).collect();
        picker.sample(&high_priority, high_quota, rng);

        let untested: Vec<QuestionId> = self
            .states
            .iter()
            .filter(|(id, state)| state.is_untested() && !picker.contains(**id))
            .map(|(id, _)| *id)
            .collect();
        picker.sample(&untested, untested_quota, rng);

        let random_pool = self.unchosen(&picker);
        picker.sample(&random_pool, random_quota, rng);

        if picker.len() < adjusted {
            let remaining = self.unchosen(&picker);
            picker.sample(&remaining, adjusted - picker.len(), rng);
        }

        let mut selected = picker.into_selected();
        selected.shuffle(rng);
        selected.truncate(adjusted);

        tracing::debug!(
            requested = n,
            adjusted,
            high_quota,
            untested_quota,
            random_quota,
            selected = selected.len(),
            "selected round"
        );
        selected
    }

    fn unchosen(&self, picker: &Picker) -> Vec<QuestionId> {
        self.states
            .keys()
            .copied()
            .filter(|id| !picker.contains(*id))
            .collect()
    }

    /// Record one answer for `id` at `now`.
    ///
    /// Negative or non-finite `time_taken` is stored as 0.
    ///
    /// # Errors
    ///
    /// Returns `BankError::UnknownQuestion` without touching any state if `id`
    /// is not part of this bank.
    pub fn update_question_state(
        &mut self,
        id: QuestionId,
        correct: bool,
        time_taken: f64,
        now: DateTime<Utc>,
    ) -> Result<&LearningState, BankError> {
        let state = self
            .states
            .get_mut(&id)
            .ok_or(BankError::UnknownQuestion(id))?;
        let time_taken = if time_taken.is_finite() {
            time_taken.max(0.0)
        } else {
            0.0
        };

        state.record_answer(correct, time_taken, now);
        self.category_stats
            .entry(state.category().to_owned())
            .or_default()
            .record(correct);

        Ok(state)
    }

    /// Per-category counters with accuracy and the live mean difficulty.
    #[must_use]
    pub fn category_stats_report(&self) -> BTreeMap<String, CategoryReport> {
        self.category_stats
            .iter()
            .map(|(category, stats)| {
                let report = CategoryReport {
                    total_attempts: stats.total_attempts,
                    correct_attempts: stats.correct_attempts,
                    accuracy: stats.accuracy(),
                    avg_difficulty: scoring::category_difficulty(self, category),
                };
                (category.clone(), report)
            })
            .collect()
    }

    /// Easy/medium/hard histogram over every question in the bank.
    #[must_use]
    pub fn difficulty_distribution(&self) -> DifficultyDistribution {
        let mut dist = DifficultyDistribution::default();
        for state in self.states.values() {
            dist.add(state.difficulty());
        }
        dist
    }
}

pub(crate) fn fresh_category_stats(questions: &QuestionSet) -> BTreeMap<String, CategoryStats> {
    questions
        .categories()
        .into_iter()
        .map(|c| (c.to_owned(), CategoryStats::default()))
        .collect()
}

fn quota(adjusted: usize, share: f64) -> usize {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let q = (adjusted as f64 * share).floor() as usize;
    q
}

/// Ordered selection that never holds an id twice.
struct Picker {
    selected: Vec<QuestionId>,
    chosen: HashSet<QuestionId>,
}

impl Picker {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            selected: Vec::with_capacity(capacity),
            chosen: HashSet::with_capacity(capacity),
        }
    }

    fn contains(&self, id: QuestionId) -> bool {
        self.chosen.contains(&id)
    }

    fn len(&self) -> usize {
        self.selected.len()
    }

    /// Uniformly sample up to `amount` ids from `pool` without replacement.
    fn sample<R: Rng + ?Sized>(&mut self, pool: &[QuestionId], amount: usize, rng: &mut R) {
        for id in pool.choose_multiple(rng, amount) {
            if self.chosen.insert(*id) {
                self.selected.push(*id);
            }
        }
    }

    fn into_selected(self) -> Vec<QuestionId> {
        self.selected
    }
}
