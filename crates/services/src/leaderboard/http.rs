use std::env;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use quiz_core::model::{EntryId, LeaderboardEntry, LeaderboardSubmission, QuizId};
use storage::repository::{LeaderboardRepository, StorageError};

use crate::error::HttpLeaderboardError;

const LEADERBOARD_PATH: &str = "/api/leaderboard";

#[derive(Clone, Debug)]
pub struct LeaderboardHttpConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl LeaderboardHttpConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Reads `QUIZ_LEADERBOARD_URL`; `None` when unset or blank.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_LEADERBOARD_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self::new(base_url.trim()))
    }

    fn endpoint(&self) -> String {
        format!("{}{LEADERBOARD_PATH}", self.base_url.trim_end_matches('/'))
    }
}

/// Leaderboard backend talking to a remote `/api/leaderboard` endpoint.
#[derive(Clone)]
pub struct HttpLeaderboardRepository {
    client: Client,
    config: LeaderboardHttpConfig,
}

impl HttpLeaderboardRepository {
    /// # Errors
    ///
    /// Returns `HttpLeaderboardError::Http` if the client cannot be built.
    pub fn new(config: LeaderboardHttpConfig) -> Result<Self, HttpLeaderboardError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn post_entry(
        &self,
        submission: &LeaderboardSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, HttpLeaderboardError> {
        let payload = SubmitRequest {
            quiz_id: submission.quiz_id().as_str(),
            name: submission.name(),
            email: submission.email(),
            percentage: submission.percentage(),
            points: submission.points(),
            completed_at: submission.completed_at(),
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HttpLeaderboardError::HttpStatus(response.status()));
        }

        let body: SubmitResponse = response.json().await?;
        body.entry.into_entry(submitted_at)
    }

    async fn get_entries(
        &self,
        quiz_id: &QuizId,
    ) -> Result<Vec<LeaderboardEntry>, HttpLeaderboardError> {
        let response = self
            .client
            .get(self.config.endpoint())
            .query(&[("quizId", quiz_id.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HttpLeaderboardError::HttpStatus(response.status()));
        }

        let body: ListResponse = response.json().await?;
        body.into_entries()
    }
}

#[async_trait]
impl LeaderboardRepository for HttpLeaderboardRepository {
    async fn append_entry(
        &self,
        submission: &LeaderboardSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, StorageError> {
        Ok(self.post_entry(submission, submitted_at).await?)
    }

    async fn list_entries(&self, quiz_id: &QuizId) -> Result<Vec<LeaderboardEntry>, StorageError> {
        Ok(self.get_entries(quiz_id).await?)
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    quiz_id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    percentage: u8,
    points: u32,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    entry: WireEntry,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    leaderboard: Vec<WireEntry>,
}

impl ListResponse {
    fn into_entries(self) -> Result<Vec<LeaderboardEntry>, HttpLeaderboardError> {
        self.leaderboard
            .into_iter()
            .map(|entry| {
                let submitted_at = entry.submitted_at.unwrap_or(entry.completed_at);
                entry.into_entry(submitted_at)
            })
            .collect()
    }
}

/// Older servers store quiz ids as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireQuizId {
    Text(String),
    Number(u64),
}

impl From<WireQuizId> for QuizId {
    fn from(id: WireQuizId) -> Self {
        match id {
            WireQuizId::Text(text) => QuizId::new(text),
            WireQuizId::Number(n) => QuizId::new(n.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEntry {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    quiz_id: WireQuizId,
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    points: u32,
    percentage: f64,
    completed_at: DateTime<Utc>,
    #[serde(default, alias = "createdAt")]
    submitted_at: Option<DateTime<Utc>>,
}

impl WireEntry {
    fn into_entry(self, fallback_submitted_at: DateTime<Utc>) -> Result<LeaderboardEntry, HttpLeaderboardError> {
        if !(0.0..=100.0).contains(&self.percentage) {
            return Err(HttpLeaderboardError::Malformed(format!(
                "percentage {} out of range",
                self.percentage
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percentage = self.percentage.round() as u8;

        Ok(LeaderboardEntry {
            id: EntryId::new(self.id),
            quiz_id: self.quiz_id.into(),
            name: self.name,
            email: self.email.filter(|email| !email.trim().is_empty()),
            points: self.points,
            percentage,
            completed_at: self.completed_at,
            submitted_at: self.submitted_at.unwrap_or(fallback_submitted_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[test]
    fn endpoint_joins_base_url() {
        let config = LeaderboardHttpConfig::new("https://dmv.example.com/");
        assert_eq!(config.endpoint(), "https://dmv.example.com/api/leaderboard");
    }

    #[test]
    fn list_response_accepts_numeric_quiz_ids() {
        let body = r#"{"leaderboard":[
            {"_id":"65a1","quizId":7,"name":"Ana","points":30,"percentage":75,
             "completedAt":"2024-01-01T10:00:00Z","createdAt":"2024-01-01T10:00:05Z"},
            {"_id":"65a2","quizId":"permit-1","name":"Ben","email":"","percentage":100,
             "completedAt":"2024-01-01T11:00:00Z"}
        ]}"#;
        let parsed: ListResponse = serde_json::from_str(body).unwrap();
        let entries = parsed.into_entries().unwrap();

        assert_eq!(entries[0].quiz_id, QuizId::new("7"));
        assert_eq!(entries[0].id, EntryId::new("65a1"));
        assert_ne!(entries[0].submitted_at, entries[0].completed_at);
        assert_eq!(entries[1].quiz_id, QuizId::new("permit-1"));
        assert_eq!(entries[1].email, None);
        assert_eq!(entries[1].points, 0);
        assert_eq!(entries[1].submitted_at, entries[1].completed_at);
    }

    #[test]
    fn missing_leaderboard_field_is_empty() {
        let parsed: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.into_entries().unwrap().is_empty());
    }

    #[test]
    fn out_of_range_percentage_is_malformed() {
        let body = r#"{"entry":{"_id":"x","quizId":"q","name":"A","percentage":140,
            "completedAt":"2024-01-01T10:00:00Z"}}"#;
        let parsed: SubmitResponse = serde_json::from_str(body).unwrap();
        let err = parsed.entry.into_entry(fixed_now()).unwrap_err();
        assert!(matches!(err, HttpLeaderboardError::Malformed(_)));
        assert!(matches!(
            StorageError::from(err),
            StorageError::Serialization(_)
        ));
    }

    #[test]
    fn submit_request_uses_camel_case_and_skips_missing_email() {
        let submission =
            LeaderboardSubmission::new(QuizId::new("q"), "Ana", None, 30, 75, fixed_now()).unwrap();
        let payload = SubmitRequest {
            quiz_id: submission.quiz_id().as_str(),
            name: submission.name(),
            email: submission.email(),
            percentage: submission.percentage(),
            points: submission.points(),
            completed_at: submission.completed_at(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["quizId"], "q");
        assert_eq!(json["points"], 30);
        assert!(json.get("email").is_none());
        assert!(json.get("completedAt").is_some());
    }
}
