use std::collections::BTreeMap;

use chrono::Duration;
use quiz_core::model::{Question, QuestionId, QuestionSet};
use quiz_core::time::fixed_now;
use quiz_core::{ProgressDocument, QuestionBank};
use storage::repository::{ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;

fn question_set() -> QuestionSet {
    let questions = (1..=4).map(|id| {
        let options = BTreeMap::from([
            ("a".to_owned(), format!("A{id}")),
            ("b".to_owned(), format!("B{id}")),
        ]);
        let category = if id % 2 == 0 { "even" } else { "odd" };
        Question::new(QuestionId::new(id), category, format!("Q{id}"), options, "a")
    });
    QuestionSet::new(questions).unwrap()
}

fn played_document() -> (QuestionBank, ProgressDocument) {
    let mut bank = QuestionBank::new(question_set());
    let now = fixed_now();
    bank.update_question_state(QuestionId::new(1), true, 2.0, now)
        .unwrap();
    bank.update_question_state(QuestionId::new(2), false, 8.5, now + Duration::minutes(1))
        .unwrap();
    let doc = ProgressDocument {
        bank_state: bank.export_state(now + Duration::minutes(2)),
        session_stats: None,
    };
    (bank, doc)
}

#[tokio::test]
async fn sqlite_roundtrip_restores_bank_state() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let (bank, doc) = played_document();
    let id = repo.save_progress(&doc, fixed_now()).await.unwrap();

    let record = repo.get_progress(id).await.expect("fetch");
    assert_eq!(record.saved_at, fixed_now());
    assert_eq!(record.document, doc);

    let restored = QuestionBank::import_state(question_set(), &record.document.bank_state).unwrap();
    assert_eq!(restored, bank);
}

#[tokio::test]
async fn sqlite_latest_and_listing_are_newest_first() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_latest?mode=memory&cache=shared")
        .await
        .expect("storage");

    assert!(storage.progress.latest_progress().await.unwrap().is_none());

    let (_, doc) = played_document();
    let older = storage.progress.save_progress(&doc, fixed_now()).await.unwrap();
    let newer = storage
        .progress
        .save_progress(&doc, fixed_now() + Duration::hours(1))
        .await
        .unwrap();

    let latest = storage.progress.latest_progress().await.unwrap().unwrap();
    assert_eq!(latest.id, newer);

    let listed = storage.progress.list_progress(1).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, newer);

    let all = storage.progress.list_progress(10).await.unwrap();
    assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![newer, older]);
}

#[tokio::test]
async fn sqlite_missing_progress_is_not_found() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // migrations are idempotent
    repo.migrate().await.expect("migrate twice");

    let err = repo.get_progress(404).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
