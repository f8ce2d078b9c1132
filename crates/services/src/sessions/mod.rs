mod progress;
mod service;
mod stats;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{RoundProgress, RoundState, RoundSummary};
pub use service::{AnsweredQuestion, QuizSession};
pub use stats::SessionStats;
