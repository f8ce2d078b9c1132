use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::ProgressDocument;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A saved progress document with its storage metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub id: i64,
    pub saved_at: DateTime<Utc>,
    pub document: ProgressDocument,
}

/// Repository contract for saved learner progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Store a progress document, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be serialized or stored.
    async fn save_progress(
        &self,
        document: &ProgressDocument,
        saved_at: DateTime<Utc>,
    ) -> Result<i64, StorageError>;

    /// Fetch a saved document by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_progress(&self, id: i64) -> Result<ProgressRecord, StorageError>;

    /// Most recently saved document, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn latest_progress(&self) -> Result<Option<ProgressRecord>, StorageError>;

    /// Saved documents, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn list_progress(&self, limit: u32) -> Result<Vec<ProgressRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<Vec<ProgressRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(records: &[ProgressRecord]) -> Vec<ProgressRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then(b.id.cmp(&a.id)));
    sorted
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn save_progress(
        &self,
        document: &ProgressDocument,
        saved_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = guard.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        guard.push(ProgressRecord {
            id,
            saved_at,
            document: document.clone(),
        });
        Ok(id)
    }

    async fn get_progress(&self, id: i64) -> Result<ProgressRecord, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn latest_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(newest_first(&guard).into_iter().next())
    }

    async fn list_progress(&self, limit: u32) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(newest_first(&guard).into_iter().take(limit).collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
