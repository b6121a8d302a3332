use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{EntryId, LeaderboardEntry, LeaderboardSubmission, QuizId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Client-scoped string key-value storage (browser-profile style).
///
/// Values are opaque strings; callers decide the encoding.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Append-only store of leaderboard entries.
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Append a submission. The store assigns the entry id; `submitted_at` is
    /// used unless the store keeps its own clock.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_entry(
        &self,
        submission: &LeaderboardSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, StorageError>;

    /// All entries for a quiz, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entries cannot be read.
    async fn list_entries(&self, quiz_id: &QuizId) -> Result<Vec<LeaderboardEntry>, StorageError>;
}

/// Simple in-memory storage for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    values: Arc<Mutex<HashMap<String, String>>>,
    entries: Arc<Mutex<Vec<LeaderboardEntry>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryRepository {
    async fn append_entry(
        &self,
        submission: &LeaderboardSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, StorageError> {
        let entry = submission
            .clone()
            .into_entry(EntryId::generate(), submitted_at);
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(entry.clone());
        Ok(entry)
    }

    async fn list_entries(&self, quiz_id: &QuizId) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|entry| entry.quiz_id == *quiz_id)
            .cloned()
            .collect())
    }
}

/// Aggregates the key-value store and leaderboard behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub values: Arc<dyn KeyValueStore>,
    pub leaderboard: Arc<dyn LeaderboardRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let values: Arc<dyn KeyValueStore> = Arc::new(repo.clone());
        let leaderboard: Arc<dyn LeaderboardRepository> = Arc::new(repo);
        Self {
            values,
            leaderboard,
        }
    }

    /// Replace the leaderboard backend, e.g. with a remote one.
    #[must_use]
    pub fn with_leaderboard(mut self, leaderboard: Arc<dyn LeaderboardRepository>) -> Self {
        self.leaderboard = leaderboard;
        self
    }
}
