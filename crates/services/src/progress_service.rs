use std::sync::Arc;

use quiz_core::model::QuestionSet;
use quiz_core::{ProgressDocument, QuestionBank};
use storage::repository::{ProgressRecord, ProgressRepository};

use crate::error::ProgressError;
use crate::sessions::QuizSession;
use crate::Clock;

/// Saves and restores learner progress through a repository.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    /// Bank snapshot plus the current session report, stamped with the clock.
    #[must_use]
    pub fn snapshot(&self, session: &QuizSession) -> ProgressDocument {
        let now = self.clock.now();
        ProgressDocument {
            bank_state: session.bank().export_state(now),
            session_stats: Some(session.session_report_at(now)),
        }
    }

    /// Persist the session's progress and return the saved id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the repository rejects the document.
    pub async fn save(&self, session: &QuizSession) -> Result<i64, ProgressError> {
        let document = self.snapshot(session);
        let id = self
            .progress
            .save_progress(&document, self.clock.now())
            .await?;
        tracing::info!(id, questions = document.bank_state.states.len(), "progress saved");
        Ok(id)
    }

    /// Restore the most recently saved bank for `questions`.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the lookup fails and
    /// `ProgressError::Snapshot` if the saved state does not fit the questions.
    pub async fn load_latest(
        &self,
        questions: &QuestionSet,
    ) -> Result<Option<QuestionBank>, ProgressError> {
        let Some(record) = self.progress.latest_progress().await? else {
            return Ok(None);
        };
        restore(&record, questions).map(Some)
    }

    /// Restore the bank saved under `id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` (including `NotFound`) if the record
    /// cannot be read and `ProgressError::Snapshot` if it cannot be imported.
    pub async fn load(
        &self,
        id: i64,
        questions: &QuestionSet,
    ) -> Result<QuestionBank, ProgressError> {
        let record = self.progress.get_progress(id).await?;
        restore(&record, questions)
    }

    /// Saved records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if repository access fails.
    pub async fn history(&self, limit: u32) -> Result<Vec<ProgressRecord>, ProgressError> {
        Ok(self.progress.list_progress(limit).await?)
    }
}

fn restore(record: &ProgressRecord, questions: &QuestionSet) -> Result<QuestionBank, ProgressError> {
    let bank = QuestionBank::import_state(questions.clone(), &record.document.bank_state)?;
    tracing::info!(id = record.id, saved_at = %record.saved_at, "progress restored");
    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Question, QuestionId};
    use quiz_core::time::fixed_now;
    use quiz_core::SnapshotError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeMap;
    use storage::repository::{InMemoryRepository, StorageError};

    fn questions(ids: &[u64]) -> QuestionSet {
        QuestionSet::new(ids.iter().map(|id| {
            let options = BTreeMap::from([
                ("a".to_owned(), "left".to_owned()),
                ("b".to_owned(), "right".to_owned()),
            ]);
            Question::new(QuestionId::new(*id), "sides", format!("Q{id}"), options, "b")
        }))
        .unwrap()
    }

    fn played_session(set: &QuestionSet) -> QuizSession {
        let mut session = QuizSession::new(QuestionBank::new(set.clone()), Clock::fixed(fixed_now()));
        session.start_round_with(2, &mut StdRng::seed_from_u64(5));
        session
            .handle_answer_at(false, fixed_now() + Duration::seconds(4))
            .unwrap();
        session
    }

    #[tokio::test]
    async fn save_then_load_latest_restores_the_bank() {
        let set = questions(&[1, 2, 3]);
        let session = played_session(&set);
        let service = ProgressService::new(
            Clock::fixed(fixed_now()),
            Arc::new(InMemoryRepository::new()),
        );

        assert!(service.load_latest(&set).await.unwrap().is_none());

        let id = service.save(&session).await.unwrap();
        let restored = service.load_latest(&set).await.unwrap().unwrap();
        assert_eq!(&restored, session.bank());
        assert_eq!(service.load(id, &set).await.unwrap(), restored);
        assert_eq!(service.history(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_includes_the_session_report() {
        let set = questions(&[1, 2]);
        let session = played_session(&set);
        let service = ProgressService::new(
            Clock::fixed(fixed_now()),
            Arc::new(InMemoryRepository::new()),
        );

        let document = service.snapshot(&session);
        let report = document.session_stats.unwrap();
        assert_eq!(report.category_performance["sides"].report.total_attempts, 1);
        assert_eq!(document.bank_state.states.len(), 2);
    }

    #[tokio::test]
    async fn missing_id_is_not_found() {
        let service = ProgressService::new(
            Clock::fixed(fixed_now()),
            Arc::new(InMemoryRepository::new()),
        );
        let err = service.load(7, &questions(&[1])).await.unwrap_err();
        assert!(matches!(err, ProgressError::Storage(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn saved_state_that_does_not_fit_is_rejected() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ProgressService::new(Clock::fixed(fixed_now()), repo.clone());
        let mut document = service.snapshot(&played_session(&questions(&[1, 2])));
        let copied = document.bank_state.states["1"].clone();
        document
            .bank_state
            .states
            .insert("not-a-number".to_owned(), copied);
        repo.save_progress(&document, fixed_now()).await.unwrap();

        let err = service.load_latest(&questions(&[1, 2])).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressError::Snapshot(SnapshotError::InvalidId(_))
        ));
    }
}
