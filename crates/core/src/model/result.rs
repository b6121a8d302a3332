use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, QuizId};

/// Points awarded per correct answer on the leaderboard.
pub const POINTS_PER_CORRECT_ANSWER: u32 = 10;

/// Outcome for one question of a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    /// `None` when the question was left unanswered (`-1` on the wire).
    #[serde(with = "unanswered_sentinel")]
    pub selected_answer: Option<usize>,
    pub is_correct: bool,
}

/// Summary of a finished attempt. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub quiz_id: QuizId,
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub percentage: u8,
    pub passed: bool,
    pub answers: Vec<AnswerRecord>,
    pub completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Leaderboard points for this attempt.
    #[must_use]
    pub fn points(&self) -> u32 {
        self.correct_answers
            .saturating_mul(POINTS_PER_CORRECT_ANSWER)
    }

    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.answers
            .iter()
            .filter(|record| record.selected_answer.is_none())
            .count()
    }
}

mod unanswered_sentinel {
    use serde::{Deserialize, Deserializer, Serializer};

    const UNANSWERED: i64 = -1;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(index) => s.serialize_u64(*index as u64),
            None => s.serialize_i64(UNANSWERED),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(d)?;
        if raw < 0 {
            return Ok(None);
        }
        usize::try_from(raw)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
