use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use quiz_core::model::{Question, QuestionId, QuestionSet, QuizSettings};
use quiz_core::time::fixed_now;
use services::{Clock, ProgressService, QuizContext, RoundState};
use storage::repository::{InMemoryRepository, ProgressRepository};

fn question_set() -> QuestionSet {
    let questions = (1..=6).map(|id| {
        let options = BTreeMap::from([
            ("a".to_owned(), format!("{id}")),
            ("b".to_owned(), format!("{}", id * 10)),
        ]);
        let category = if id <= 3 { "small" } else { "large" };
        Question::new(
            QuestionId::new(id),
            category,
            format!("Which is {id}?"),
            options,
            "a",
        )
    });
    QuestionSet::new(questions).unwrap()
}

#[tokio::test]
async fn round_with_review_is_saved_and_restored() {
    let set = question_set();
    let mut clock = Clock::fixed(fixed_now());
    let settings = QuizSettings::new(4).unwrap();
    let mut context = QuizContext::new(set.clone(), settings, clock);

    // skip the first question, answer everything else in order
    let first = context.session().current_question().unwrap();
    let skipped = context.session_mut().handle_skip();
    assert_eq!(skipped, Some(first));

    let mut served = 0;
    while let Some(id) = context.session().current_question() {
        clock.advance(Duration::seconds(2));
        let correct = id.value() % 2 == 0;
        let answered = context
            .session_mut()
            .handle_answer_at(correct, clock.now())
            .unwrap()
            .unwrap();
        assert_eq!(answered.question_id, id);
        served += 1;
    }

    let session = context.session();
    assert_eq!(served, 4);
    assert_eq!(session.round_state(), RoundState::RoundComplete);
    assert_eq!(session.bank().state(first).unwrap().times_shown(), 1);
    assert_eq!(session.round_summary().skipped, 1);

    let repo = InMemoryRepository::new();
    let progress = ProgressService::new(clock, Arc::new(repo.clone()));
    let id = progress.save(session).await.unwrap();

    let record = repo.get_progress(id).await.unwrap();
    let report = record.document.session_stats.as_ref().unwrap();
    assert_eq!(report.session_stats.duration, 8.0);
    assert_eq!(report.difficulty_distribution.total(), 6);

    let restored = progress.load_latest(&set).await.unwrap().unwrap();
    assert_eq!(&restored, session.bank());

    let mut resumed = QuizContext::from_bank(restored, settings, clock);
    assert!(resumed.session().pending().len() <= 4);
    assert_eq!(resumed.session().stats().answered(), 0);
    assert!(resumed.start_round() > 0);
}
