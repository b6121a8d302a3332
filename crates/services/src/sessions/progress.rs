use quiz_core::model::QuestionId;

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    /// 1-based position of the current question; 0 for an empty quiz.
    pub position: usize,
    /// How far through the quiz the current question is, as a whole percentage.
    pub percent_through: u8,
    pub is_complete: bool,
}

/// One button of the question-number picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorItem {
    pub index: usize,
    pub question_id: QuestionId,
    pub answered: bool,
    pub current: bool,
}
