use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::{Difficulty, Question};

/// A question as presented in one attempt: options permuted, correct index remapped.
///
/// `options()[correct_answer()]` always equals the original question's correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffledQuestion {
    question: Question,
    shuffled_options: Vec<String>,
    shuffled_correct_answer: usize,
    original_index: usize,
}

impl ShuffledQuestion {
    pub(crate) fn new(
        question: Question,
        shuffled_options: Vec<String>,
        shuffled_correct_answer: usize,
        original_index: usize,
    ) -> Self {
        Self {
            question,
            shuffled_options,
            shuffled_correct_answer,
            original_index,
        }
    }

    /// Presents a question in its authored order.
    #[must_use]
    pub fn unshuffled(question: Question, original_index: usize) -> Self {
        let options = question.options().to_vec();
        let correct = question.correct_answer();
        Self::new(question, options, correct, original_index)
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.question.id()
    }

    /// The question as authored.
    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        self.question.prompt()
    }

    /// Options in presentation order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.shuffled_options
    }

    /// Index of the correct option in presentation order.
    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.shuffled_correct_answer
    }

    /// Position of this question in the authored quiz.
    #[must_use]
    pub fn original_index(&self) -> usize {
        self.original_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.question.explanation()
    }

    #[must_use]
    pub fn category(&self) -> &str {
        self.question.category()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.question.difficulty()
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.question.image()
    }

    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.shuffled_correct_answer
    }

    /// True when the presentation is a faithful permutation of `original`:
    /// same id, same option multiset, and the correct index still names the
    /// original correct option.
    #[must_use]
    pub fn is_consistent_with(&self, original: &Question) -> bool {
        if self.question != *original {
            return false;
        }
        if self.shuffled_options.len() != original.options().len() {
            return false;
        }
        let Some(correct) = self.shuffled_options.get(self.shuffled_correct_answer) else {
            return false;
        };
        if correct != original.correct_option() {
            return false;
        }

        let mut presented: Vec<&str> = self.shuffled_options.iter().map(String::as_str).collect();
        let mut authored: Vec<&str> = original.options().iter().map(String::as_str).collect();
        presented.sort_unstable();
        authored.sort_unstable();
        presented == authored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question::new(
            QuestionId::new(9),
            "Q",
            vec!["a".into(), "b".into(), "c".into()],
            1,
            "General",
        )
        .unwrap()
    }

    #[test]
    fn unshuffled_keeps_authored_order() {
        let shuffled = ShuffledQuestion::unshuffled(question(), 3);
        assert_eq!(shuffled.options(), question().options());
        assert_eq!(shuffled.correct_answer(), 1);
        assert_eq!(shuffled.original_index(), 3);
        assert!(shuffled.is_consistent_with(&question()));
    }

    #[test]
    fn detects_broken_correct_binding() {
        let shuffled = ShuffledQuestion::new(
            question(),
            vec!["b".into(), "a".into(), "c".into()],
            1,
            0,
        );
        assert!(!shuffled.is_consistent_with(&question()));
    }

    #[test]
    fn detects_changed_options() {
        let shuffled = ShuffledQuestion::new(
            question(),
            vec!["b".into(), "a".into(), "z".into()],
            0,
            0,
        );
        assert!(!shuffled.is_consistent_with(&question()));
    }
}
