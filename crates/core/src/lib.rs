#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod model;
pub mod scoring;
pub mod snapshot;
pub mod time;

pub use bank::{BankError, QuestionBank};
pub use error::Error;
pub use snapshot::{BankSnapshot, ProgressDocument, SnapshotError, StateSnapshot};
pub use time::Clock;
