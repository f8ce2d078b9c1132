//! JSON file transport for question sets and saved progress.

use std::fs;
use std::path::Path;

use quiz_core::model::{QuestionSet, QuestionSetError};
use quiz_core::{ProgressDocument, SnapshotError};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FileError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    QuestionSet {
        path: String,
        #[source]
        source: QuestionSetError,
    },
    #[error("{path}: {source}")]
    Snapshot {
        path: String,
        #[source]
        source: SnapshotError,
    },
}

fn read(path: &Path) -> Result<String, FileError> {
    fs::read_to_string(path).map_err(|source| FileError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load and validate a `{"questions": [...]}` file.
///
/// # Errors
///
/// Returns `FileError::Io` if the file cannot be read and
/// `FileError::QuestionSet` if its content is malformed.
pub fn read_question_set(path: impl AsRef<Path>) -> Result<QuestionSet, FileError> {
    let path = path.as_ref();
    let raw = read(path)?;
    let set = QuestionSet::from_json_str(&raw).map_err(|source| FileError::QuestionSet {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), questions = set.len(), "loaded question set");
    Ok(set)
}

/// Read a saved progress document.
///
/// # Errors
///
/// Returns `FileError::Io` if the file cannot be read and
/// `FileError::Snapshot` if it is not a progress document.
pub fn read_progress(path: impl AsRef<Path>) -> Result<ProgressDocument, FileError> {
    let path = path.as_ref();
    let raw = read(path)?;
    ProgressDocument::from_json_str(&raw).map_err(|source| FileError::Snapshot {
        path: path.display().to_string(),
        source,
    })
}

/// Write a progress document as pretty-printed JSON, replacing the file.
///
/// # Errors
///
/// Returns `FileError` if serialization or the write fails.
pub fn write_progress(path: impl AsRef<Path>, document: &ProgressDocument) -> Result<(), FileError> {
    let path = path.as_ref();
    let json = document
        .to_json_pretty()
        .map_err(|source| FileError::Snapshot {
            path: path.display().to_string(),
            source,
        })?;
    fs::write(path, json).map_err(|source| FileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote progress");
    Ok(())
}
