use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use quiz_core::model::{CategoryPerformance, QuestionId, SessionMetrics, SessionReport};
use quiz_core::time::elapsed_secs;
use quiz_core::{Clock, QuestionBank};
use rand::Rng;

use super::progress::{RoundProgress, RoundState, RoundSummary};
use super::stats::SessionStats;
use crate::error::SessionError;

//
// ─── ANSWER RESULT ─────────────────────────────────────────────────────────────
//

/// Outcome of answering the current question, for feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct AnsweredQuestion {
    pub question_id: QuestionId,
    pub correct: bool,
    pub elapsed_secs: f64,
    pub correct_answer: String,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learner's quiz session: a bank plus the round being played.
///
/// A round serves `pending` first. Skipped questions move to the back of
/// `skipped`; once `pending` is empty the session is reviewing and answers and
/// skips act on the head of `skipped` instead. Skipped questions are never moved
/// back into `pending`.
pub struct QuizSession {
    bank: QuestionBank,
    clock: Clock,
    pending: VecDeque<QuestionId>,
    skipped: VecDeque<QuestionId>,
    round_total: usize,
    stats: SessionStats,
}

impl QuizSession {
    /// Wrap a bank. No round is active until `start_round` is called.
    #[must_use]
    pub fn new(bank: QuestionBank, clock: Clock) -> Self {
        Self {
            bank,
            clock,
            pending: VecDeque::new(),
            skipped: VecDeque::new(),
            round_total: 0,
            stats: SessionStats::new(clock.now()),
        }
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Ids not yet answered or skipped this round; head first.
    #[must_use]
    pub fn pending(&self) -> &VecDeque<QuestionId> {
        &self.pending
    }

    /// Ids deferred for review; head first.
    #[must_use]
    pub fn skipped(&self) -> &VecDeque<QuestionId> {
        &self.skipped
    }

    /// Hard reset: select a new round of up to `n` questions and clear stats.
    ///
    /// Returns the number of questions selected.
    pub fn start_round(&mut self, n: usize) -> usize {
        self.start_round_with(n, &mut rand::rng())
    }

    /// Same as [`QuizSession::start_round`] with a caller-supplied RNG.
    pub fn start_round_with<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> usize {
        let now = self.clock.now();
        let selected = self.bank.select_questions_with(n, now, rng);

        self.round_total = selected.len();
        self.pending = selected.into();
        self.skipped.clear();
        self.stats = SessionStats::new(now);

        tracing::info!(requested = n, selected = self.round_total, "round started");
        self.round_total
    }

    #[must_use]
    pub fn round_state(&self) -> RoundState {
        if !self.pending.is_empty() {
            RoundState::InRound
        } else if !self.skipped.is_empty() {
            RoundState::Reviewing
        } else {
            RoundState::RoundComplete
        }
    }

    #[must_use]
    pub fn is_round_complete(&self) -> bool {
        self.round_state() == RoundState::RoundComplete
    }

    /// Question to show now: the pending head, else the skipped head.
    #[must_use]
    pub fn current_question(&self) -> Option<QuestionId> {
        self.pending
            .front()
            .or_else(|| self.skipped.front())
            .copied()
    }

    fn active_queue(&mut self) -> Option<&mut VecDeque<QuestionId>> {
        if !self.pending.is_empty() {
            Some(&mut self.pending)
        } else if !self.skipped.is_empty() {
            Some(&mut self.skipped)
        } else {
            None
        }
    }

    /// Answer the current question using the session clock.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::handle_answer_at`].
    pub fn handle_answer(&mut self, correct: bool) -> Result<Option<AnsweredQuestion>, SessionError> {
        let now = self.clock.now();
        self.handle_answer_at(correct, now)
    }

    /// Answer the current question at `now`.
    ///
    /// Elapsed time is `now` minus the moment the question was served. Returns
    /// `Ok(None)` without side effects when the round is complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Bank` if the current id is unknown to the bank; the
    /// session is left unchanged in that case.
    pub fn handle_answer_at(
        &mut self,
        correct: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<AnsweredQuestion>, SessionError> {
        let Some(id) = self.current_question() else {
            return Ok(None);
        };
        let elapsed = elapsed_secs(self.stats.question_started_at(), now);

        let category = self.bank.update_question_state(id, correct, elapsed, now)?
            .category()
            .to_owned();
        let correct_answer = self
            .bank
            .question(id)
            .map(|q| q.correct_answer().to_owned())
            .unwrap_or_default();

        if let Some(queue) = self.active_queue() {
            queue.pop_front();
        }
        self.stats.record_answer(&category, correct, elapsed, now);

        tracing::debug!(question = %id, correct, elapsed, "answered");
        if self.is_round_complete() {
            tracing::info!(
                correct = self.stats.correct(),
                wrong = self.stats.wrong(),
                skipped = self.stats.skipped(),
                "round complete"
            );
        }

        Ok(Some(AnsweredQuestion {
            question_id: id,
            correct,
            elapsed_secs: elapsed,
            correct_answer,
        }))
    }

    /// Skip the current question using the session clock.
    pub fn handle_skip(&mut self) -> Option<QuestionId> {
        let now = self.clock.now();
        self.handle_skip_at(now)
    }

    /// Defer the current question to the back of the skipped queue.
    ///
    /// Learning state is untouched. Returns the skipped id, or `None` when the
    /// round is complete. During review the head of `skipped` rotates to its
    /// tail, and every such skip counts again in `SessionStats::skipped`.
    pub fn handle_skip_at(&mut self, now: DateTime<Utc>) -> Option<QuestionId> {
        let id = self.active_queue()?.pop_front()?;
        self.skipped.push_back(id);
        self.stats.record_skip(now);
        tracing::debug!(question = %id, "skipped");
        Some(id)
    }

    #[must_use]
    pub fn progress(&self) -> RoundProgress {
        let handled = self.stats.answered() + self.stats.skipped();
        RoundProgress {
            position: usize::try_from(handled).unwrap_or(usize::MAX).saturating_add(1),
            total: self.round_total,
            answered: usize::try_from(self.stats.answered()).unwrap_or(usize::MAX),
            remaining: self.pending.len(),
            deferred: self.skipped.len(),
            state: self.round_state(),
        }
    }

    #[must_use]
    pub fn round_summary(&self) -> RoundSummary {
        RoundSummary {
            correct: self.stats.correct(),
            wrong: self.stats.wrong(),
            skipped: self.stats.skipped(),
            accuracy: self.stats.accuracy(),
            best_streak: self.stats.best_streak(),
        }
    }

    /// Statistics report using the session clock.
    #[must_use]
    pub fn get_session_report(&self) -> SessionReport {
        self.session_report_at(self.clock.now())
    }

    /// Category performance, session metrics and the bank-wide difficulty
    /// histogram as of `now`.
    #[must_use]
    pub fn session_report_at(&self, now: DateTime<Utc>) -> SessionReport {
        let category_performance = self
            .bank
            .category_stats_report()
            .into_iter()
            .map(|(category, report)| {
                let avg_time = self.stats.average_time(&category);
                (category, CategoryPerformance { report, avg_time })
            })
            .collect();

        let duration = elapsed_secs(self.stats.started_at(), now);
        let answered = f64::from(self.stats.answered());
        let questions_per_minute = if duration > 0.0 {
            answered / (duration / 60.0)
        } else {
            0.0
        };

        SessionReport {
            category_performance,
            session_stats: SessionMetrics {
                duration,
                questions_per_minute,
                accuracy: self.stats.accuracy(),
                streak: self.stats.streak(),
                best_streak: self.stats.best_streak(),
            },
            difficulty_distribution: self.bank.difficulty_distribution(),
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions", &self.bank.len())
            .field("pending_len", &self.pending.len())
            .field("skipped_len", &self.skipped.len())
            .field("round_total", &self.round_total)
            .field("state", &self.round_state())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
