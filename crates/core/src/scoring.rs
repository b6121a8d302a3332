use chrono::{DateTime, Utc};

use crate::model::{AnswerRecord, AnswerSheet, QuizId, QuizResult, ShuffledQuestion};

/// Whole percentage of `correct` out of `total`, rounded half up. Zero for an empty quiz.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let rounded = (correct * 200 + total) / (total * 2);
    u8::try_from(rounded).unwrap_or(100)
}

/// Score an attempt.
///
/// A question with no recorded selection counts as incorrect. An empty quiz
/// scores 0% and never passes.
#[must_use]
pub fn build_result(
    quiz_id: &QuizId,
    questions: &[ShuffledQuestion],
    answers: &AnswerSheet,
    passing_score: u8,
    completed_at: DateTime<Utc>,
) -> QuizResult {
    let records: Vec<AnswerRecord> = questions
        .iter()
        .map(|question| {
            let selected_answer = answers.get(question.id());
            AnswerRecord {
                question_id: question.id(),
                selected_answer,
                is_correct: selected_answer.is_some_and(|s| question.is_correct(s)),
            }
        })
        .collect();

    let total = u32::try_from(records.len()).unwrap_or(u32::MAX);
    let correct = u32::try_from(records.iter().filter(|r| r.is_correct).count()).unwrap_or(total);
    let percentage = percentage(correct, total);

    QuizResult {
        quiz_id: quiz_id.clone(),
        score: correct,
        total_questions: total,
        correct_answers: correct,
        incorrect_answers: total - correct,
        percentage,
        passed: total > 0 && percentage >= passing_score,
        answers: records,
        completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuestionId};
    use crate::time::fixed_now;

    fn questions(n: u64) -> Vec<ShuffledQuestion> {
        (0..n)
            .map(|i| {
                let q = Question::new(
                    QuestionId::new(i),
                    format!("Q{i}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    1,
                    "General",
                )
                .unwrap();
                ShuffledQuestion::unshuffled(q, usize::try_from(i).unwrap())
            })
            .collect()
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(2, 3), 67); // 66.67
        assert_eq!(percentage(1, 3), 33); // 33.33
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn empty_quiz_scores_zero_and_fails() {
        let result = build_result(&QuizId::new("q"), &[], &AnswerSheet::new(), 0, fixed_now());
        assert_eq!(result.percentage, 0);
        assert!(!result.passed);
        assert_eq!(result.total_questions, 0);
    }

    #[test]
    fn three_of_four_passes_at_seventy_five() {
        let qs = questions(4);
        let mut answers = AnswerSheet::new();
        answers.record(QuestionId::new(0), 1);
        answers.record(QuestionId::new(1), 1);
        answers.record(QuestionId::new(2), 1);
        answers.record(QuestionId::new(3), 0);

        let result = build_result(&QuizId::new("q"), &qs, &answers, 75, fixed_now());

        assert_eq!(result.correct_answers, 3);
        assert_eq!(result.incorrect_answers, 1);
        assert_eq!(result.total_questions, 4);
        assert_eq!(result.percentage, 75);
        assert!(result.passed);
    }

    #[test]
    fn passing_boundary_is_inclusive() {
        let qs = questions(100);
        let answers: AnswerSheet = (0..70).map(|i| (QuestionId::new(i), 1)).collect();
        let at_seventy = build_result(&QuizId::new("q"), &qs, &answers, 70, fixed_now());
        assert_eq!(at_seventy.percentage, 70);
        assert!(at_seventy.passed);

        let answers: AnswerSheet = (0..69).map(|i| (QuestionId::new(i), 1)).collect();
        let at_sixty_nine = build_result(&QuizId::new("q"), &qs, &answers, 70, fixed_now());
        assert_eq!(at_sixty_nine.percentage, 69);
        assert!(!at_sixty_nine.passed);
    }

    #[test]
    fn unanswered_counts_as_incorrect() {
        let qs = questions(2);
        let mut answers = AnswerSheet::new();
        answers.record(QuestionId::new(0), 1);

        let result = build_result(&QuizId::new("q"), &qs, &answers, 50, fixed_now());

        assert_eq!(result.answers[1].selected_answer, None);
        assert!(!result.answers[1].is_correct);
        assert_eq!(result.unanswered(), 1);
        assert_eq!(result.percentage, 50);
    }

    #[test]
    fn out_of_range_selection_is_just_wrong() {
        let qs = questions(1);
        let answers: AnswerSheet = [(QuestionId::new(0), 9)].into_iter().collect();
        let result = build_result(&QuizId::new("q"), &qs, &answers, 50, fixed_now());
        assert!(!result.answers[0].is_correct);
    }

    #[test]
    fn scoring_is_deterministic() {
        let qs = questions(3);
        let answers: AnswerSheet = [(QuestionId::new(0), 1), (QuestionId::new(2), 0)]
            .into_iter()
            .collect();
        let a = build_result(&QuizId::new("q"), &qs, &answers, 60, fixed_now());
        let b = build_result(&QuizId::new("q"), &qs, &answers, 60, fixed_now());
        assert_eq!(a, b);
    }
}
