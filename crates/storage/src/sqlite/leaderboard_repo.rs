use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{EntryId, LeaderboardEntry, LeaderboardSubmission, QuizId};

use super::SqliteRepository;
use super::mapping::{conn, map_entry_row};
use crate::repository::{LeaderboardRepository, StorageError};

#[async_trait]
impl LeaderboardRepository for SqliteRepository {
    async fn append_entry(
        &self,
        submission: &LeaderboardSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO leaderboard_entries (
                    quiz_id, name, email, points, percentage, completed_at, submitted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(submission.quiz_id().as_str())
        .bind(submission.name())
        .bind(submission.email())
        .bind(i64::from(submission.points()))
        .bind(i64::from(submission.percentage()))
        .bind(submission.completed_at())
        .bind(submitted_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = EntryId::new(res.last_insert_rowid().to_string());
        Ok(submission.clone().into_entry(id, submitted_at))
    }

    async fn list_entries(&self, quiz_id: &QuizId) -> Result<Vec<LeaderboardEntry>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, quiz_id, name, email, points, percentage, completed_at, submitted_at
                FROM leaderboard_entries
                WHERE quiz_id = ?1
            ",
        )
        .bind(quiz_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_entry_row).collect()
    }
}
