use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::QuestionId;

/// Selected option per question, in presentation order indices. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet(BTreeMap<QuestionId, usize>);

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a selection and returns the one it replaced, if any.
    pub fn record(&mut self, question: QuestionId, selected: usize) -> Option<usize> {
        self.0.insert(question, selected)
    }

    #[must_use]
    pub fn get(&self, question: QuestionId) -> Option<usize> {
        self.0.get(&question).copied()
    }

    #[must_use]
    pub fn contains(&self, question: QuestionId) -> bool {
        self.0.contains_key(&question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, usize)> + '_ {
        self.0.iter().map(|(id, selected)| (*id, *selected))
    }
}

impl FromIterator<(QuestionId, usize)> for AnswerSheet {
    fn from_iter<T: IntoIterator<Item = (QuestionId, usize)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut sheet = AnswerSheet::new();
        assert_eq!(sheet.record(QuestionId::new(1), 0), None);
        assert_eq!(sheet.record(QuestionId::new(1), 2), Some(0));
        assert_eq!(sheet.get(QuestionId::new(1)), Some(2));
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn serializes_as_object_keyed_by_question_id() {
        let sheet: AnswerSheet = [(QuestionId::new(3), 1), (QuestionId::new(10), 0)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&sheet).unwrap();
        assert_eq!(json, r#"{"3":1,"10":0}"#);
        let back: AnswerSheet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sheet);
    }
}
