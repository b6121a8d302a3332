//! Persistence of in-progress attempts, working shuffles and finished results.
//!
//! Everything is stored as JSON under keys scoped by quiz id. Unreadable or
//! corrupt values load as "nothing saved"; they never fail a session.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use quiz_core::model::{AnswerSheet, QuestionId, QuizId, QuizResult, ShuffledQuestion};
use storage::repository::{KeyValueStore, StorageError};

const HISTORY_KEY: &str = "quiz-results";

fn progress_key(quiz_id: &QuizId) -> String {
    format!("quiz-progress-{quiz_id}")
}

fn shuffle_key(quiz_id: &QuizId) -> String {
    format!("quiz-shuffle-{quiz_id}")
}

/// Snapshot of an attempt in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProgress {
    pub quiz_id: QuizId,
    pub current_question: usize,
    pub answers: AnswerSheet,
    #[serde(default)]
    pub revealed: BTreeSet<QuestionId>,
    pub started_at: DateTime<Utc>,
}

/// Write-through store for quiz progress, scoped per quiz id.
#[derive(Clone)]
pub struct ProgressStore {
    values: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(values: Arc<dyn KeyValueStore>) -> Self {
        Self { values }
    }

    /// Persist the current pointer and answers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be encoded or written.
    pub async fn save(&self, progress: &SavedProgress) -> Result<(), StorageError> {
        self.write_json(&progress_key(&progress.quiz_id), progress)
            .await
    }

    /// Most recently saved progress for `quiz_id`, or `None`.
    pub async fn load(&self, quiz_id: &QuizId) -> Option<SavedProgress> {
        let progress: SavedProgress = self.read_json(&progress_key(quiz_id)).await?;
        if progress.quiz_id != *quiz_id {
            tracing::warn!(%quiz_id, saved = %progress.quiz_id, "saved progress belongs to another quiz");
            return None;
        }
        Some(progress)
    }

    /// Remove saved progress for `quiz_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self, quiz_id: &QuizId) -> Result<(), StorageError> {
        self.values.delete(&progress_key(quiz_id)).await
    }

    /// Persist the working shuffle so a resumed attempt sees the same order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be encoded or written.
    pub async fn save_shuffle(
        &self,
        quiz_id: &QuizId,
        questions: &[ShuffledQuestion],
    ) -> Result<(), StorageError> {
        self.write_json(&shuffle_key(quiz_id), &questions).await
    }

    pub async fn load_shuffle(&self, quiz_id: &QuizId) -> Option<Vec<ShuffledQuestion>> {
        self.read_json(&shuffle_key(quiz_id)).await
    }

    /// Remove the saved shuffle for `quiz_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear_shuffle(&self, quiz_id: &QuizId) -> Result<(), StorageError> {
        self.values.delete(&shuffle_key(quiz_id)).await
    }

    /// Append a finished result to the local history list.
    ///
    /// A missing or corrupt history starts a fresh list. A failed read is
    /// returned untouched so the stored history is never overwritten blind.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be read or written.
    pub async fn append_history(&self, result: &QuizResult) -> Result<(), StorageError> {
        let mut history: Vec<QuizResult> = match self.values.get(HISTORY_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(key = HISTORY_KEY, error = %err, "replacing corrupt history");
                Vec::new()
            }),
            None => Vec::new(),
        };
        history.push(result.clone());
        self.write_json(HISTORY_KEY, &history).await
    }

    /// All finished results, oldest first.
    pub async fn history(&self) -> Vec<QuizResult> {
        self.read_json(HISTORY_KEY).await.unwrap_or_default()
    }

    /// Finished results for one quiz, oldest first.
    pub async fn history_for(&self, quiz_id: &QuizId) -> Vec<QuizResult> {
        self.history()
            .await
            .into_iter()
            .filter(|result| result.quiz_id == *quiz_id)
            .collect()
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let encoded =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.values.set(key, &encoded).await?;
        tracing::debug!(key, bytes = encoded.len(), "saved");
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.values.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key, error = %err, "storage unavailable, treating as empty");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring corrupt saved value");
                None
            }
        }
    }
}
