use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} needs at least 2 options, got {len}")]
    TooFewOptions { id: QuestionId, len: usize },

    #[error("question {id} marks option {index} correct but only has {len} options")]
    CorrectAnswerOutOfRange {
        id: QuestionId,
        index: usize,
        len: usize,
    },
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in static quiz content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two options are
    /// given, or the correct-answer index does not point at an option.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id: self.id });
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                id: self.id,
                len: self.options.len(),
            });
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                id: self.id,
                index: self.correct_answer,
                len: self.options.len(),
            });
        }

        Ok(Question {
            id: self.id,
            prompt: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation.filter(|text| !text.trim().is_empty()),
            category: self.category,
            difficulty: self.difficulty,
            image: self.image.filter(|path| !path.trim().is_empty()),
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question whose correct index always points at one of its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: Option<String>,
    category: String,
    difficulty: Option<Difficulty>,
    image: Option<String>,
}

impl Question {
    /// Creates a question without explanation, difficulty or image.
    ///
    /// # Errors
    ///
    /// See [`QuestionDraft::validate`].
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        category: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        QuestionDraft {
            id,
            question: prompt.into(),
            options,
            correct_answer,
            explanation: None,
            category: category.into(),
            difficulty: None,
            image: None,
        }
        .validate()
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer]
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question: q.prompt,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
            category: q.category,
            difficulty: q.difficulty,
            image: q.image,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn rejects_out_of_range_correct_answer() {
        let err = Question::new(QuestionId::new(1), "Q", options(&["a", "b"]), 2, "Signs")
            .unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectAnswerOutOfRange { index: 2, len: 2, .. }
        ));
    }

    #[test]
    fn rejects_single_option() {
        let err = Question::new(QuestionId::new(1), "Q", options(&["a"]), 0, "Signs").unwrap_err();
        assert!(matches!(err, QuestionError::TooFewOptions { len: 1, .. }));
    }

    #[test]
    fn rejects_blank_prompt() {
        let err =
            Question::new(QuestionId::new(1), "  ", options(&["a", "b"]), 0, "Signs").unwrap_err();
        assert!(matches!(err, QuestionError::EmptyPrompt { .. }));
    }

    #[test]
    fn deserializes_site_json() {
        let json = r#"{
            "id": 4,
            "question": "What does a red octagon mean?",
            "options": ["Yield", "Stop", "Merge"],
            "correctAnswer": 1,
            "explanation": "Octagons are always stop signs.",
            "category": "Road Signs",
            "difficulty": "easy",
            "image": "/images/stop.png"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id(), QuestionId::new(4));
        assert_eq!(q.correct_option(), "Stop");
        assert_eq!(q.difficulty(), Some(Difficulty::Easy));
        assert_eq!(q.image(), Some("/images/stop.png"));
    }

    #[test]
    fn deserialization_runs_validation() {
        let json = r#"{"id": 1, "question": "Q", "options": ["a", "b"], "correctAnswer": 5}"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let q = QuestionDraft {
            id: QuestionId::new(1),
            question: "Q".into(),
            options: options(&["a", "b"]),
            correct_answer: 0,
            explanation: Some("   ".into()),
            category: String::new(),
            difficulty: None,
            image: None,
        }
        .validate()
        .unwrap();
        assert_eq!(q.explanation(), None);
    }
}
