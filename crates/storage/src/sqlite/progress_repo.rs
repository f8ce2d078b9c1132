use chrono::{DateTime, Utc};
use quiz_core::ProgressDocument;

use super::SqliteRepository;
use super::mapping::{count_to_i64, document_to_json, map_progress_row};
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn save_progress(
        &self,
        document: &ProgressDocument,
        saved_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let json = document_to_json(document)?;
        let question_count = count_to_i64("question_count", document.bank_state.states.len())?;

        let res = sqlx::query(
            r"
                INSERT INTO progress_snapshots (saved_at, exported_at, question_count, document)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(saved_at)
        .bind(document.bank_state.timestamp.as_str())
        .bind(question_count)
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_progress(&self, id: i64) -> Result<ProgressRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, saved_at, document
                FROM progress_snapshots
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_progress_row(&row)
    }

    async fn latest_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, saved_at, document
                FROM progress_snapshots
                ORDER BY saved_at DESC, id DESC
                LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self, limit: u32) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, saved_at, document
                FROM progress_snapshots
                ORDER BY saved_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_progress_row).collect()
    }
}
