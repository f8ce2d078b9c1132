use thiserror::Error;

/// Default number of questions requested per round.
pub const DEFAULT_ROUND_SIZE: u32 = 50;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("round size must be > 0")]
    InvalidRoundSize,
}

/// Learner-facing quiz configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    round_size: u32,
}

impl QuizSettings {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidRoundSize` if `round_size` is zero.
    pub fn new(round_size: u32) -> Result<Self, SettingsError> {
        if round_size == 0 {
            return Err(SettingsError::InvalidRoundSize);
        }
        Ok(Self { round_size })
    }

    /// Requested questions per round, before fatigue shrinking.
    #[must_use]
    pub fn round_size(&self) -> usize {
        usize::try_from(self.round_size).unwrap_or(usize::MAX)
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            round_size: DEFAULT_ROUND_SIZE,
        }
    }
}
