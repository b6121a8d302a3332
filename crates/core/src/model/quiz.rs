use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz id cannot be empty")]
    EmptyId,

    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("passing score must be between 0 and 100, got {0}")]
    InvalidPassingScore(u32),

    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(QuestionId),

    #[error("time limit must be at least one minute")]
    InvalidTimeLimit,
}

/// Unvalidated quiz as stored in static content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub id: QuizId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub slug: String,
    pub questions: Vec<Question>,
    pub passing_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

impl QuizDraft {
    /// Validate the draft into a `Quiz`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for a blank id or title, a passing score above 100,
    /// a zero time limit, or repeated question ids.
    pub fn validate(self) -> Result<Quiz, QuizError> {
        if self.id.is_blank() {
            return Err(QuizError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        let passing_score = u8::try_from(self.passing_score)
            .ok()
            .filter(|score| *score <= 100)
            .ok_or(QuizError::InvalidPassingScore(self.passing_score))?;
        if self.time_limit == Some(0) {
            return Err(QuizError::InvalidTimeLimit);
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        for question in &self.questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestionId(question.id()));
            }
        }

        Ok(Quiz {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            slug: self.slug,
            questions: self.questions,
            passing_score,
            time_limit_minutes: self.time_limit,
        })
    }
}

/// An ordered set of questions with a passing threshold. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizDraft", into = "QuizDraft")]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    category: String,
    slug: String,
    questions: Vec<Question>,
    passing_score: u8,
    time_limit_minutes: Option<u32>,
}

impl Quiz {
    /// Creates a quiz with no description, category, slug or time limit.
    ///
    /// # Errors
    ///
    /// See [`QuizDraft::validate`].
    pub fn new(
        id: impl Into<QuizId>,
        title: impl Into<String>,
        questions: Vec<Question>,
        passing_score: u8,
    ) -> Result<Self, QuizError> {
        QuizDraft {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            slug: String::new(),
            questions,
            passing_score: u32::from(passing_score),
            time_limit: None,
        }
        .validate()
    }

    /// Returns a copy with the given time limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTimeLimit` for a zero limit.
    pub fn with_time_limit(mut self, minutes: u32) -> Result<Self, QuizError> {
        if minutes == 0 {
            return Err(QuizError::InvalidTimeLimit);
        }
        self.time_limit_minutes = Some(minutes);
        Ok(self)
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Passing threshold as a whole percentage.
    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> Option<u32> {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_minutes
            .map(|minutes| Duration::minutes(i64::from(minutes)))
    }
}

impl TryFrom<QuizDraft> for Quiz {
    type Error = QuizError;

    fn try_from(draft: QuizDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Quiz> for QuizDraft {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            category: quiz.category,
            slug: quiz.slug,
            questions: quiz.questions,
            passing_score: u32::from(quiz.passing_score),
            time_limit: quiz.time_limit_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["a".into(), "b".into()],
            0,
            "General",
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let err = Quiz::new("q1", "Quiz", vec![question(1), question(1)], 70).unwrap_err();
        assert_eq!(err, QuizError::DuplicateQuestionId(QuestionId::new(1)));
    }

    #[test]
    fn rejects_passing_score_above_hundred() {
        let err = Quiz::new("q1", "Quiz", vec![question(1)], 101).unwrap_err();
        assert_eq!(err, QuizError::InvalidPassingScore(101));
    }

    #[test]
    fn rejects_blank_id() {
        let err = Quiz::new(" ", "Quiz", vec![question(1)], 70).unwrap_err();
        assert_eq!(err, QuizError::EmptyId);
    }

    #[test]
    fn empty_quiz_is_allowed() {
        let quiz = Quiz::new("empty", "Nothing here", Vec::new(), 70).unwrap();
        assert!(quiz.is_empty());
    }

    #[test]
    fn zero_time_limit_is_rejected() {
        let quiz = Quiz::new("q1", "Quiz", vec![question(1)], 70).unwrap();
        assert_eq!(quiz.with_time_limit(0).unwrap_err(), QuizError::InvalidTimeLimit);
    }

    #[test]
    fn parses_site_quiz_file() {
        let json = r#"{
            "id": "california-permit-1",
            "title": "California Permit Practice Test 1",
            "description": "Road signs and rules",
            "category": "permit",
            "slug": "california-permit-test-1",
            "passingScore": 83,
            "timeLimit": 30,
            "questions": [
                {"id": 1, "question": "Q1", "options": ["a", "b"], "correctAnswer": 0, "category": "Signs"},
                {"id": 2, "question": "Q2", "options": ["a", "b", "c"], "correctAnswer": 2, "category": "Rules"}
            ]
        }"#;
        let quiz: Quiz = serde_json::from_str(json).unwrap();
        assert_eq!(quiz.id().as_str(), "california-permit-1");
        assert_eq!(quiz.passing_score(), 83);
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz.time_limit(), Some(Duration::minutes(30)));
    }
}
