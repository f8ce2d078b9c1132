use quiz_core::model::{QuestionSet, QuizSettings};
use quiz_core::{BankSnapshot, QuestionBank, SnapshotError};

use crate::sessions::QuizSession;
use crate::Clock;

/// Everything one learner's quiz needs, passed around explicitly.
///
/// Owns the question set, the settings and the live session. Front ends hold
/// one of these per learner instead of sharing process-wide state.
#[derive(Debug)]
pub struct QuizContext {
    questions: QuestionSet,
    settings: QuizSettings,
    session: QuizSession,
}

impl QuizContext {
    /// Fresh learning state for `questions`, with the first round started.
    #[must_use]
    pub fn new(questions: QuestionSet, settings: QuizSettings, clock: Clock) -> Self {
        Self::from_bank(QuestionBank::new(questions), settings, clock)
    }

    /// Continue from an existing bank, with a new round started.
    #[must_use]
    pub fn from_bank(bank: QuestionBank, settings: QuizSettings, clock: Clock) -> Self {
        let questions = bank.questions().clone();
        let mut session = QuizSession::new(bank, clock);
        session.start_round(settings.round_size());
        Self {
            questions,
            settings,
            session,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut QuizSession {
        &mut self.session
    }

    /// Start a new round of the configured size.
    pub fn start_round(&mut self) -> usize {
        self.session.start_round(self.settings.round_size())
    }

    /// Replace learning state with `snapshot` and start a new round.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the snapshot cannot be applied; the live
    /// session is left exactly as it was.
    pub fn restore(&mut self, snapshot: &BankSnapshot) -> Result<usize, SnapshotError> {
        let bank = QuestionBank::import_state(self.questions.clone(), snapshot)?;
        self.session = QuizSession::new(bank, self.session.clock());
        Ok(self.start_round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionId};
    use quiz_core::time::fixed_now;
    use std::collections::BTreeMap;

    fn questions(count: u64) -> QuestionSet {
        QuestionSet::new((1..=count).map(|id| {
            let options = BTreeMap::from([
                ("a".to_owned(), "true".to_owned()),
                ("b".to_owned(), "false".to_owned()),
            ]);
            Question::new(QuestionId::new(id), "facts", format!("Q{id}"), options, "a")
        }))
        .unwrap()
    }

    #[test]
    fn new_context_starts_a_configured_round() {
        let settings = QuizSettings::new(3).unwrap();
        let context = QuizContext::new(questions(10), settings, Clock::fixed(fixed_now()));
        assert_eq!(context.session().pending().len(), 3);
        assert_eq!(context.settings().round_size(), 3);
    }

    #[test]
    fn restore_swaps_in_the_snapshot_and_starts_a_round() {
        let settings = QuizSettings::new(2).unwrap();
        let mut context = QuizContext::new(questions(4), settings, Clock::fixed(fixed_now()));
        context.session_mut().handle_answer(true).unwrap();
        let snapshot = context.session().bank().export_state(fixed_now());

        let mut other = QuizContext::new(questions(4), settings, Clock::fixed(fixed_now()));
        assert_eq!(other.restore(&snapshot).unwrap(), 2);
        assert_eq!(other.session().bank(), context.session().bank());
        assert_eq!(other.session().stats().answered(), 0);
    }

    #[test]
    fn failed_restore_leaves_the_session_untouched() {
        let settings = QuizSettings::new(2).unwrap();
        let mut context = QuizContext::new(questions(4), settings, Clock::fixed(fixed_now()));
        context.session_mut().handle_answer(false).unwrap();
        let before_bank = context.session().bank().clone();
        let before_pending = context.session().pending().clone();

        let mut snapshot = before_bank.export_state(fixed_now());
        if let Some(state) = snapshot.states.get_mut("1") {
            state.mastery_level = 3.0;
        }

        assert!(context.restore(&snapshot).is_err());
        assert_eq!(context.session().bank(), &before_bank);
        assert_eq!(context.session().pending(), &before_pending);
        assert_eq!(context.session().stats().answered(), 1);
    }
}
