use std::sync::Arc;

use chrono::{DateTime, Utc};

use quiz_core::Clock;
use quiz_core::model::{
    LeaderboardEntry, LeaderboardStats, LeaderboardSubmission, QuizId, QuizResult, rank_entries,
};
use storage::repository::LeaderboardRepository;

use crate::error::LeaderboardError;

/// A leaderboard row with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub rank: usize,
    pub entry: LeaderboardEntry,
}

/// Ranked entries for one quiz plus summary stats.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeaderboardView {
    pub entries: Vec<RankedEntry>,
    pub stats: LeaderboardStats,
}

impl LeaderboardView {
    #[must_use]
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>) -> Self {
        rank_entries(&mut entries);
        let stats = LeaderboardStats::from_entries(&entries);
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| RankedEntry { rank: i + 1, entry })
            .collect();
        Self { entries, stats }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Submits finished attempts and reads ranked standings.
#[derive(Clone)]
pub struct LeaderboardService {
    clock: Clock,
    repo: Arc<dyn LeaderboardRepository>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn LeaderboardRepository>) -> Self {
        Self { clock, repo }
    }

    /// Validate and store a submission for a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Validation` for a blank name and
    /// `LeaderboardError::Storage` when the backend rejects the entry.
    pub async fn submit(
        &self,
        result: &QuizResult,
        name: &str,
        email: Option<&str>,
    ) -> Result<LeaderboardEntry, LeaderboardError> {
        let submission = LeaderboardSubmission::from_result(result, name, email)?;
        self.submit_prepared(&submission, self.clock.now()).await
    }

    /// Store an already validated submission.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` when the backend rejects the entry.
    pub async fn submit_prepared(
        &self,
        submission: &LeaderboardSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, LeaderboardError> {
        let entry = self.repo.append_entry(submission, submitted_at).await?;
        tracing::info!(
            quiz_id = %entry.quiz_id,
            entry_id = %entry.id,
            percentage = entry.percentage,
            "leaderboard entry submitted"
        );
        Ok(entry)
    }

    /// Entries for `quiz_id`, best first. Empty when the backend fails.
    pub async fn fetch(&self, quiz_id: &QuizId) -> Vec<LeaderboardEntry> {
        match self.repo.list_entries(quiz_id).await {
            Ok(mut entries) => {
                rank_entries(&mut entries);
                entries
            }
            Err(err) => {
                tracing::warn!(%quiz_id, error = %err, "leaderboard unavailable");
                Vec::new()
            }
        }
    }

    /// Ranked entries with stats.
    pub async fn view(&self, quiz_id: &QuizId) -> LeaderboardView {
        LeaderboardView::from_entries(self.fetch(quiz_id).await)
    }
}
