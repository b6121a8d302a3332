use std::sync::{Arc, Mutex, PoisonError};

use chrono::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;

use quiz_core::model::{Quiz, QuizResult, ShuffledQuestion};
use quiz_core::shuffle::{self, Shuffler};
use quiz_core::Clock;

use super::service::{Advance, QuizSession};
use crate::error::SessionError;
use crate::progress_store::ProgressStore;

/// Orchestrates quiz attempts with write-through progress persistence.
///
/// Storage failures never fail a transition: they are logged and the
/// in-memory session stays authoritative.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    progress: ProgressStore,
    shuffler: Shuffler,
    rng: Arc<Mutex<StdRng>>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, progress: ProgressStore) -> Self {
        Self {
            clock,
            progress,
            shuffler: Shuffler::default(),
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Use a deterministic random source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    #[must_use]
    pub fn with_shuffler(mut self, shuffler: Shuffler) -> Self {
        self.shuffler = shuffler;
        self
    }

    #[must_use]
    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress
    }

    /// Open an attempt at `quiz`, resuming saved progress when the saved
    /// shuffle still matches the quiz.
    pub async fn start(&self, quiz: Arc<Quiz>) -> QuizSession {
        let quiz_id = quiz.id().clone();

        if let Some(questions) = self.progress.load_shuffle(&quiz_id).await {
            if shuffle::matches_quiz(&questions, &quiz) {
                let session = match self.progress.load(&quiz_id).await {
                    Some(saved) => {
                        tracing::info!(%quiz_id, current = saved.current_question, "resuming attempt");
                        QuizSession::resume(quiz, questions, saved)
                    }
                    None => QuizSession::new(quiz, questions, self.clock.now()),
                };
                self.persist(&session).await;
                return session;
            }
            tracing::warn!(%quiz_id, "saved shuffle no longer matches quiz, reshuffling");
            self.discard(&quiz).await;
        }

        let questions = self.fresh_shuffle(&quiz);
        self.save_shuffle(&quiz, &questions).await;
        let session = QuizSession::new(quiz, questions, self.clock.now());
        self.persist(&session).await;
        tracing::info!(%quiz_id, questions = session.questions().len(), "started attempt");
        session
    }

    /// # Errors
    ///
    /// Propagates the rejected transition; nothing is persisted then.
    pub async fn select_option(
        &self,
        session: &mut QuizSession,
        index: usize,
    ) -> Result<(), SessionError> {
        session.select_option(index)?;
        self.persist(session).await;
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates the rejected transition; nothing is persisted then.
    pub async fn reveal(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        session.reveal()?;
        self.persist(session).await;
        Ok(())
    }

    /// Advance, completing the attempt after the last question.
    ///
    /// # Errors
    ///
    /// Propagates the rejected transition; nothing is persisted then.
    pub async fn next(&self, session: &mut QuizSession) -> Result<Advance, SessionError> {
        let advance = session.next(self.clock.now())?;
        match &advance {
            Advance::Moved { .. } => self.persist(session).await,
            Advance::Completed(result) => self.complete(session.quiz(), result).await,
        }
        Ok(advance)
    }

    /// # Errors
    ///
    /// Propagates the rejected transition; nothing is persisted then.
    pub async fn previous(&self, session: &mut QuizSession) -> Result<usize, SessionError> {
        let index = session.previous()?;
        self.persist(session).await;
        Ok(index)
    }

    /// # Errors
    ///
    /// Propagates the rejected transition; nothing is persisted then.
    pub async fn jump_to(&self, session: &mut QuizSession, index: usize) -> Result<(), SessionError> {
        session.jump_to(index)?;
        self.persist(session).await;
        Ok(())
    }

    /// Score the attempt immediately, e.g. when its time limit runs out.
    ///
    /// # Errors
    ///
    /// Propagates the rejected transition; nothing is persisted then.
    pub async fn finish(&self, session: &mut QuizSession) -> Result<QuizResult, SessionError> {
        let result = session.finish(self.clock.now())?.clone();
        self.complete(session.quiz(), &result).await;
        Ok(result)
    }

    /// Finish the attempt if its time limit has passed.
    pub async fn finish_if_expired(&self, session: &mut QuizSession) -> Option<QuizResult> {
        if session.is_complete() || !session.is_expired(self.clock.now()) {
            return None;
        }
        tracing::info!(quiz_id = %session.quiz().id(), "time limit reached");
        self.finish(session).await.ok()
    }

    /// Time left on the attempt's clock, if the quiz is timed.
    #[must_use]
    pub fn time_remaining(&self, session: &QuizSession) -> Option<Duration> {
        session.time_remaining(self.clock.now())
    }

    /// Throw away the attempt and start over with a new shuffle.
    pub async fn restart(&self, session: &mut QuizSession) {
        self.discard(session.quiz()).await;
        let questions = self.fresh_shuffle(session.quiz());
        self.save_shuffle(session.quiz(), &questions).await;
        session.restart(questions, self.clock.now());
        self.persist(session).await;
        tracing::info!(quiz_id = %session.quiz().id(), "restarted attempt");
    }

    /// Finished results for every quiz, oldest first.
    pub async fn history(&self) -> Vec<QuizResult> {
        self.progress.history().await
    }

    fn fresh_shuffle(&self, quiz: &Quiz) -> Vec<ShuffledQuestion> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.shuffler.shuffle(quiz.questions(), &mut *rng)
    }

    async fn save_shuffle(&self, quiz: &Quiz, questions: &[ShuffledQuestion]) {
        if let Err(err) = self.progress.save_shuffle(quiz.id(), questions).await {
            tracing::warn!(quiz_id = %quiz.id(), error = %err, "failed to save shuffle");
        }
    }

    async fn persist(&self, session: &QuizSession) {
        if let Err(err) = self.progress.save(&session.snapshot()).await {
            tracing::warn!(quiz_id = %session.quiz().id(), error = %err, "failed to save progress");
        }
    }

    async fn complete(&self, quiz: &Quiz, result: &QuizResult) {
        tracing::info!(
            quiz_id = %quiz.id(),
            percentage = result.percentage,
            passed = result.passed,
            "attempt completed"
        );
        if let Err(err) = self.progress.append_history(result).await {
            tracing::warn!(quiz_id = %quiz.id(), error = %err, "failed to record result");
        }
        self.discard(quiz).await;
    }

    async fn discard(&self, quiz: &Quiz) {
        if let Err(err) = self.progress.clear(quiz.id()).await {
            tracing::warn!(quiz_id = %quiz.id(), error = %err, "failed to clear progress");
        }
        if let Err(err) = self.progress.clear_shuffle(quiz.id()).await {
            tracing::warn!(quiz_id = %quiz.id(), error = %err, "failed to clear shuffle");
        }
    }
}

