mod ids;
mod question;
mod report;
mod settings;
mod state;

pub use ids::{ParseIdError, QuestionId};
pub use question::{Question, QuestionSet, QuestionSetError};
pub use report::{
    CategoryPerformance, CategoryReport, DifficultyDistribution, SessionMetrics, SessionReport,
};
pub use settings::{DEFAULT_ROUND_SIZE, QuizSettings, SettingsError};
pub use state::{CategoryStats, DifficultyTier, LearningState, MIN_DIFFICULTY, RECENT_ATTEMPTS};

#[cfg(test)]
pub(crate) use question::fixtures;
