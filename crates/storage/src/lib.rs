#![forbid(unsafe_code)]

pub mod files;
pub mod repository;
pub mod sqlite;

pub use files::FileError;
pub use repository::{
    InMemoryRepository, ProgressRecord, ProgressRepository, Storage, StorageError,
};
