use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{AnswerSheet, QuestionId, Quiz, QuizResult, ShuffledQuestion};
use quiz_core::scoring;

use super::progress::{NavigatorItem, SessionProgress};
use crate::error::SessionError;
use crate::progress_store::SavedProgress;

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No shuffle produced yet.
    Loading,
    InProgress,
    /// Terminal until `restart`.
    Completed,
}

/// Per-question sub-state within an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionState {
    Unanswered,
    /// Selection recorded, explanation hidden.
    Answered(usize),
    /// Selection recorded, explanation and correctness shown.
    Revealed(usize),
}

/// Outcome of `next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { index: usize },
    Completed(QuizResult),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state machine for one attempt at a quiz.
///
/// Every transition is synchronous and either applies fully or leaves the
/// session untouched. Persistence is the caller's job (see `QuizLoopService`).
#[derive(Clone)]
pub struct QuizSession {
    quiz: Arc<Quiz>,
    phase: SessionPhase,
    questions: Vec<ShuffledQuestion>,
    current: usize,
    answers: AnswerSheet,
    revealed: BTreeSet<QuestionId>,
    // Set by `reveal` on the current question; cleared on any navigation.
    locked: bool,
    started_at: DateTime<Utc>,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// A session waiting for its shuffle.
    #[must_use]
    pub fn loading(quiz: Arc<Quiz>, started_at: DateTime<Utc>) -> Self {
        Self {
            quiz,
            phase: SessionPhase::Loading,
            questions: Vec::new(),
            current: 0,
            answers: AnswerSheet::new(),
            revealed: BTreeSet::new(),
            locked: false,
            started_at,
            result: None,
        }
    }

    /// A session already holding its shuffle.
    #[must_use]
    pub fn new(
        quiz: Arc<Quiz>,
        questions: Vec<ShuffledQuestion>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            questions,
            phase: SessionPhase::InProgress,
            ..Self::loading(quiz, started_at)
        }
    }

    /// Supply the shuffle and start the attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is past loading.
    pub fn begin(&mut self, questions: Vec<ShuffledQuestion>) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Loading => {}
            SessionPhase::InProgress => return Err(SessionError::AlreadyStarted),
            SessionPhase::Completed => return Err(SessionError::Completed),
        }
        self.questions = questions;
        self.phase = SessionPhase::InProgress;
        Ok(())
    }

    /// Rebuild an in-progress session from a saved shuffle and snapshot.
    ///
    /// The pointer is clamped into range; answers for unknown questions or
    /// out-of-range options are dropped.
    #[must_use]
    pub fn resume(
        quiz: Arc<Quiz>,
        questions: Vec<ShuffledQuestion>,
        saved: SavedProgress,
    ) -> Self {
        let answers: AnswerSheet = saved
            .answers
            .iter()
            .filter(|(id, selected)| {
                questions
                    .iter()
                    .any(|q| q.id() == *id && *selected < q.options().len())
            })
            .collect();
        let revealed = saved
            .revealed
            .into_iter()
            .filter(|id| answers.contains(*id))
            .collect();
        let current = saved
            .current_question
            .min(questions.len().saturating_sub(1));

        Self {
            quiz,
            phase: SessionPhase::InProgress,
            questions,
            current,
            answers,
            revealed,
            locked: false,
            started_at: saved.started_at,
            result: None,
        }
    }

    //
    // ─── TRANSITIONS ──────────────────────────────────────────────────────────
    //

    /// Record a selection on the current question and hide its explanation.
    ///
    /// # Errors
    ///
    /// Rejected while loading or completed, while the explanation for this
    /// visit is shown, or for an option index out of range.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if self.locked {
            return Err(SessionError::AnswerLocked);
        }
        let question = self.current_question().ok_or(SessionError::QuestionOutOfRange {
            index: self.current,
            len: self.questions.len(),
        })?;
        let len = question.options().len();
        if index >= len {
            return Err(SessionError::OptionOutOfRange { index, len });
        }

        let id = question.id();
        self.answers.record(id, index);
        self.revealed.remove(&id);
        Ok(())
    }

    /// Show the explanation and correctness for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` if nothing is selected yet.
    pub fn reveal(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        let id = self
            .current_question()
            .map(ShuffledQuestion::id)
            .ok_or(SessionError::NoSelection)?;
        if !self.answers.contains(id) {
            return Err(SessionError::NoSelection);
        }
        self.revealed.insert(id);
        self.locked = true;
        Ok(())
    }

    /// Move to the next question, or finish the attempt on the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRevealed` unless the current question has
    /// been checked.
    pub fn next(&mut self, completed_at: DateTime<Utc>) -> Result<Advance, SessionError> {
        self.ensure_in_progress()?;
        if self.questions.is_empty() {
            return self.finish(completed_at).map(|r| Advance::Completed(r.clone()));
        }
        if !matches!(self.current_state(), Some(QuestionState::Revealed(_))) {
            return Err(SessionError::NotRevealed);
        }
        if self.is_last_question() {
            return self.finish(completed_at).map(|r| Advance::Completed(r.clone()));
        }

        self.current += 1;
        self.locked = false;
        Ok(Advance::Moved {
            index: self.current,
        })
    }

    /// Step back one question. A no-op on the first question.
    ///
    /// # Errors
    ///
    /// Rejected while loading or completed.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.ensure_in_progress()?;
        if self.current > 0 {
            self.current -= 1;
            self.locked = false;
        }
        Ok(self.current)
    }

    /// Navigate directly to a question, keeping its remembered state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuestionOutOfRange` for an invalid index.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if index >= self.questions.len() {
            return Err(SessionError::QuestionOutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.current = index;
        self.locked = false;
        Ok(())
    }

    /// Score the attempt now, whatever question is current.
    ///
    /// Used for the last question and for an expired time limit.
    ///
    /// # Errors
    ///
    /// Rejected while loading or already completed.
    pub fn finish(&mut self, completed_at: DateTime<Utc>) -> Result<&QuizResult, SessionError> {
        self.ensure_in_progress()?;
        let result = scoring::build_result(
            self.quiz.id(),
            &self.questions,
            &self.answers,
            self.quiz.passing_score(),
            completed_at,
        );
        self.phase = SessionPhase::Completed;
        self.locked = false;
        Ok(self.result.insert(result))
    }

    /// Start over with a fresh shuffle and no answers. Allowed from any phase.
    pub fn restart(&mut self, questions: Vec<ShuffledQuestion>, started_at: DateTime<Utc>) {
        *self = Self::new(Arc::clone(&self.quiz), questions, started_at);
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Loading => Err(SessionError::Loading),
            SessionPhase::InProgress => Ok(()),
            SessionPhase::Completed => Err(SessionError::Completed),
        }
    }

    //
    // ─── READ MODELS ──────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    #[must_use]
    pub fn questions(&self) -> &[ShuffledQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&ShuffledQuestion> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        !self.questions.is_empty() && self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn question_state(&self, index: usize) -> Option<QuestionState> {
        let id = self.questions.get(index)?.id();
        Some(match self.answers.get(id) {
            None => QuestionState::Unanswered,
            Some(selected) if self.revealed.contains(&id) => QuestionState::Revealed(selected),
            Some(selected) => QuestionState::Answered(selected),
        })
    }

    #[must_use]
    pub fn current_state(&self) -> Option<QuestionState> {
        self.question_state(self.current)
    }

    /// True while selection on the current question is rejected.
    #[must_use]
    pub fn is_answer_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let position = if total == 0 { 0 } else { self.current + 1 };
        SessionProgress {
            total,
            answered: self.answers.len(),
            position,
            percent_through: scoring::percentage(
                u32::try_from(position).unwrap_or(u32::MAX),
                u32::try_from(total).unwrap_or(u32::MAX),
            ),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn navigator(&self) -> Vec<NavigatorItem> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, q)| NavigatorItem {
                index,
                question_id: q.id(),
                answered: self.answers.contains(q.id()),
                current: index == self.current,
            })
            .collect()
    }

    /// Snapshot for the progress store.
    #[must_use]
    pub fn snapshot(&self) -> SavedProgress {
        SavedProgress {
            quiz_id: self.quiz.id().clone(),
            current_question: self.current,
            answers: self.answers.clone(),
            revealed: self.revealed.clone(),
            started_at: self.started_at,
        }
    }

    /// When the quiz's time limit runs out, if it has one.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.quiz.time_limit().map(|limit| self.started_at + limit)
    }

    #[must_use]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline()
            .map(|deadline| (deadline - now).max(Duration::zero()))
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", self.quiz.id())
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("locked", &self.locked)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
