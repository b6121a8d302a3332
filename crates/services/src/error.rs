//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::SubmissionError;
use storage::repository::StorageError;

/// Errors emitted by session transitions.
///
/// All of these are recoverable: the session is left unchanged when a
/// transition is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz is still loading")]
    Loading,
    #[error("quiz already started")]
    AlreadyStarted,
    #[error("quiz already completed")]
    Completed,
    #[error("answer is locked while the explanation is shown")]
    AnswerLocked,
    #[error("select an answer first")]
    NoSelection,
    #[error("check the answer before moving on")]
    NotRevealed,
    #[error("option {index} out of range (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("question {index} out of range (quiz has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },
}

/// Errors emitted by `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeaderboardError {
    #[error(transparent)]
    Validation(#[from] SubmissionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LeaderboardError {
    /// True when the caller should fix its input rather than retry.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, LeaderboardError::Validation(_))
    }
}

/// Errors emitted by the HTTP leaderboard backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpLeaderboardError {
    #[error("leaderboard request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("leaderboard response was malformed: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<HttpLeaderboardError> for StorageError {
    fn from(err: HttpLeaderboardError) -> Self {
        match err {
            HttpLeaderboardError::Malformed(msg) => StorageError::Serialization(msg),
            other => StorageError::Connection(other.to_string()),
        }
    }
}
