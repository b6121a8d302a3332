use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use crate::model::ids::{EntryId, QuizId};
use crate::model::result::QuizResult;

/// Longest display name kept on a submission, in characters.
pub const MAX_NAME_LEN: usize = 50;
/// Longest email kept on a submission, in characters.
pub const MAX_EMAIL_LEN: usize = 100;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("name is required")]
    MissingName,

    #[error("quiz id is required")]
    MissingQuizId,

    #[error("percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(u8),
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// A validated, normalized leaderboard submission ready to send to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSubmission {
    quiz_id: QuizId,
    name: String,
    email: Option<String>,
    points: u32,
    percentage: u8,
    completed_at: DateTime<Utc>,
}

impl LeaderboardSubmission {
    /// Build a submission for a finished attempt.
    ///
    /// The name is trimmed and must not be empty; name and email are cut to
    /// [`MAX_NAME_LEN`] and [`MAX_EMAIL_LEN`] characters. Points are derived
    /// from the correct-answer count.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::MissingName` for a blank name.
    pub fn from_result(
        result: &QuizResult,
        name: &str,
        email: Option<&str>,
    ) -> Result<Self, SubmissionError> {
        Self::new(
            result.quiz_id.clone(),
            name,
            email,
            result.points(),
            result.percentage,
            result.completed_at,
        )
    }

    /// Build a submission from raw fields.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` if the name or quiz id is blank or the
    /// percentage exceeds 100.
    pub fn new(
        quiz_id: QuizId,
        name: &str,
        email: Option<&str>,
        points: u32,
        percentage: u8,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SubmissionError> {
        if quiz_id.is_blank() {
            return Err(SubmissionError::MissingQuizId);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(SubmissionError::MissingName);
        }
        if percentage > 100 {
            return Err(SubmissionError::InvalidPercentage(percentage));
        }

        let email = email
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(|email| truncate_chars(email, MAX_EMAIL_LEN));

        Ok(Self {
            quiz_id,
            name: truncate_chars(name, MAX_NAME_LEN),
            email,
            points,
            percentage,
            completed_at,
        })
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Turn the submission into a stored entry.
    #[must_use]
    pub fn into_entry(self, id: EntryId, submitted_at: DateTime<Utc>) -> LeaderboardEntry {
        LeaderboardEntry {
            id,
            quiz_id: self.quiz_id,
            name: self.name,
            email: self.email,
            points: self.points,
            percentage: self.percentage,
            completed_at: self.completed_at,
            submitted_at,
        }
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

/// A stored leaderboard row. Entries are append-only and kept unsorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: EntryId,
    pub quiz_id: QuizId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub points: u32,
    pub percentage: u8,
    pub completed_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

/// Leaderboard order: higher percentage first, then earlier completion.
#[must_use]
pub fn compare_rank(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.percentage
        .cmp(&a.percentage)
        .then_with(|| a.completed_at.cmp(&b.completed_at))
}

/// Sort entries into leaderboard order. Stable for full ties.
pub fn rank_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(compare_rank);
}

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

/// Aggregate numbers shown under a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LeaderboardStats {
    pub highest_percentage: Option<u8>,
    pub average_percentage: Option<f64>,
    pub total_attempts: usize,
}

impl LeaderboardStats {
    #[must_use]
    pub fn from_entries(entries: &[LeaderboardEntry]) -> Self {
        let highest_percentage = entries.iter().map(|e| e.percentage).max();
        let average_percentage = if entries.is_empty() {
            None
        } else {
            let sum: u64 = entries.iter().map(|e| u64::from(e.percentage)).sum();
            #[allow(clippy::cast_precision_loss)]
            Some(sum as f64 / entries.len() as f64)
        };

        Self {
            highest_percentage,
            average_percentage,
            total_attempts: entries.len(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
