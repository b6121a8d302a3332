//! Per-attempt randomization of question order and option order.
//!
//! Randomness is injected so callers can seed it; the engine itself is pure.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Question, Quiz, ShuffledQuestion};

/// Decides whether a question's last option is a combined answer
/// ("Both of the above", "All of the above") that must stay in place.
///
/// Matching is trimmed and case-insensitive against a list of phrases, so
/// other languages can supply their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedOptionRule {
    phrases: Vec<String>,
}

impl Default for CombinedOptionRule {
    fn default() -> Self {
        Self::new(["both of the above", "all of the above"])
    }
}

impl CombinedOptionRule {
    #[must_use]
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// A rule that never matches; every question gets its options shuffled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            phrases: Vec::new(),
        }
    }

    #[must_use]
    pub fn matches(&self, option: &str) -> bool {
        let normalized = option.trim().to_lowercase();
        self.phrases.iter().any(|phrase| *phrase == normalized)
    }

    /// True when the question's last option is a combined answer.
    #[must_use]
    pub fn applies_to(&self, question: &Question) -> bool {
        question
            .options()
            .last()
            .is_some_and(|last| self.matches(last))
    }
}

/// Produces shuffled working copies of a quiz.
#[derive(Debug, Clone, Default)]
pub struct Shuffler {
    rule: CombinedOptionRule,
}

impl Shuffler {
    #[must_use]
    pub fn new(rule: CombinedOptionRule) -> Self {
        Self { rule }
    }

    #[must_use]
    pub fn rule(&self) -> &CombinedOptionRule {
        &self.rule
    }

    /// Permute question order, then each question's options.
    ///
    /// Both permutations are uniform (Fisher-Yates). Questions whose last option
    /// is a combined answer keep their options untouched.
    pub fn shuffle<R: Rng + ?Sized>(
        &self,
        questions: &[Question],
        rng: &mut R,
    ) -> Vec<ShuffledQuestion> {
        let mut order: Vec<usize> = (0..questions.len()).collect();
        order.shuffle(rng);

        order
            .into_iter()
            .map(|original_index| {
                self.shuffle_options(&questions[original_index], original_index, rng)
            })
            .collect()
    }

    /// Shuffle a single question's options.
    pub fn shuffle_options<R: Rng + ?Sized>(
        &self,
        question: &Question,
        original_index: usize,
        rng: &mut R,
    ) -> ShuffledQuestion {
        if self.rule.applies_to(question) {
            return ShuffledQuestion::unshuffled(question.clone(), original_index);
        }

        let mut permutation: Vec<usize> = (0..question.options().len()).collect();
        permutation.shuffle(rng);

        let options = permutation
            .iter()
            .map(|&i| question.options()[i].clone())
            .collect();
        let Some(correct) = permutation
            .iter()
            .position(|&i| i == question.correct_answer())
        else {
            // Question guarantees the correct index is in range.
            return ShuffledQuestion::unshuffled(question.clone(), original_index);
        };

        ShuffledQuestion::new(question.clone(), options, correct, original_index)
    }
}

/// Shuffle with the default combined-option rule.
pub fn shuffle_questions<R: Rng + ?Sized>(
    questions: &[Question],
    rng: &mut R,
) -> Vec<ShuffledQuestion> {
    Shuffler::default().shuffle(questions, rng)
}

/// True when a persisted shuffle still describes `quiz`: same questions, each
/// presented as a faithful permutation.
#[must_use]
pub fn matches_quiz(shuffled: &[ShuffledQuestion], quiz: &Quiz) -> bool {
    if shuffled.len() != quiz.len() {
        return false;
    }
    let mut seen = vec![false; quiz.len()];
    for presented in shuffled {
        let index = presented.original_index();
        let Some(original) = quiz.questions().get(index) else {
            return false;
        };
        if seen[index] || !presented.is_consistent_with(original) {
            return false;
        }
        seen[index] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(id: u64, options: &[&str], correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            options.iter().map(|s| (*s).to_string()).collect(),
            correct,
            "General",
        )
        .unwrap()
    }

    fn sample() -> Vec<Question> {
        (0..8)
            .map(|i| question(i, &["alpha", "bravo", "charlie", "delta"], (i % 4) as usize))
            .collect()
    }

    #[test]
    fn preserves_question_membership() {
        let questions = sample();
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = shuffle_questions(&questions, &mut rng);

        let mut before: Vec<_> = questions.iter().map(Question::id).collect();
        let mut after: Vec<_> = shuffled.iter().map(ShuffledQuestion::id).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn preserves_correct_option_binding() {
        let questions = sample();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for s in shuffle_questions(&questions, &mut rng) {
                let original = &questions[s.original_index()];
                assert_eq!(s.options()[s.correct_answer()], original.correct_option());
                assert!(s.is_consistent_with(original));
            }
        }
    }

    #[test]
    fn combined_option_stays_put() {
        let q = question(1, &["Slow down", "Honk", "  BOTH of the above "], 2);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let s = Shuffler::default().shuffle_options(&q, 0, &mut rng);
            assert_eq!(s.options(), q.options());
            assert_eq!(s.correct_answer(), q.correct_answer());
        }
    }

    #[test]
    fn all_of_the_above_matches_too() {
        assert!(CombinedOptionRule::default().matches("All of the above"));
        assert!(!CombinedOptionRule::default().matches("None of the above"));
    }

    #[test]
    fn disabled_rule_shuffles_combined_questions() {
        let q = question(1, &["a", "b", "c", "d", "e", "Both of the above"], 0);
        let shuffler = Shuffler::new(CombinedOptionRule::disabled());
        let mut rng = StdRng::seed_from_u64(11);
        let moved = (0..20).any(|_| shuffler.shuffle_options(&q, 0, &mut rng).options() != q.options());
        assert!(moved);
    }

    #[test]
    fn custom_phrases_support_other_languages() {
        let rule = CombinedOptionRule::new(["ambas respuestas"]);
        assert!(rule.matches(" Ambas Respuestas "));
        assert!(!rule.matches("Both of the above"));
    }

    #[test]
    fn same_seed_same_shuffle() {
        let questions = sample();
        let a = shuffle_questions(&questions, &mut StdRng::seed_from_u64(42));
        let b = shuffle_questions(&questions, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(shuffle_questions(&[], &mut rng).is_empty());
    }

    #[test]
    fn question_order_is_roughly_uniform() {
        let questions: Vec<_> = (0..3).map(|i| question(i, &["x", "y"], 0)).collect();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts = std::collections::HashMap::new();
        let trials = 6_000;
        for _ in 0..trials {
            let order: Vec<u64> = shuffle_questions(&questions, &mut rng)
                .iter()
                .map(|s| s.id().value())
                .collect();
            *counts.entry(order).or_insert(0_u32) += 1;
        }
        assert_eq!(counts.len(), 6);
        for count in counts.values() {
            assert!((800..1200).contains(count), "skewed permutation count {count}");
        }
    }

    #[test]
    fn matches_quiz_rejects_edited_content() {
        let questions = sample();
        let quiz = Quiz::new("q", "Quiz", questions.clone(), 70).unwrap();
        let shuffled = shuffle_questions(&questions, &mut StdRng::seed_from_u64(5));
        assert!(matches_quiz(&shuffled, &quiz));

        let mut edited = questions;
        edited[0] = question(0, &["alpha", "bravo", "charlie", "echo"], 0);
        let edited = Quiz::new("q", "Quiz", edited, 70).unwrap();
        assert!(!matches_quiz(&shuffled, &edited));
    }

    #[test]
    fn matches_quiz_rejects_length_change() {
        let questions = sample();
        let shuffled = shuffle_questions(&questions, &mut StdRng::seed_from_u64(5));
        let shorter = Quiz::new("q", "Quiz", questions[..4].to_vec(), 70).unwrap();
        assert!(!matches_quiz(&shuffled, &shorter));
    }
}
