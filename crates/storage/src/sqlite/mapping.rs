use chrono::{DateTime, Utc};
use quiz_core::ProgressDocument;
use sqlx::Row;

use crate::repository::{ProgressRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn document_to_json(document: &ProgressDocument) -> Result<String, StorageError> {
    serde_json::to_string(document).map_err(ser)
}

pub(crate) fn count_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let saved_at: DateTime<Utc> = row.try_get("saved_at").map_err(ser)?;
    let raw: String = row.try_get("document").map_err(ser)?;
    let document = ProgressDocument::from_json_str(&raw).map_err(ser)?;

    Ok(ProgressRecord {
        id,
        saved_at,
        document,
    })
}
