#![forbid(unsafe_code)]

pub mod error;
pub mod progress_service;
pub mod quiz_context;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{ProgressError, SessionError};
pub use progress_service::ProgressService;
pub use quiz_context::QuizContext;

pub use sessions::{
    AnsweredQuestion, QuizSession, RoundProgress, RoundState, RoundSummary, SessionStats,
};
