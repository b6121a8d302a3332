use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{Question, QuestionId, Quiz, QuizId};
use quiz_core::time::{fixed_clock, fixed_now};
use services::{Advance, ProgressStore, QuestionState, QuizLoopService, QuizSession, SessionError};
use storage::repository::{InMemoryRepository, KeyValueStore, StorageError};

fn permit_quiz() -> Arc<Quiz> {
    let questions = (1..=4)
        .map(|i| {
            Question::new(
                QuestionId::new(i),
                format!("Question {i}?"),
                vec!["Stop".into(), "Yield".into(), "Go".into(), "Both of the above".into()],
                i as usize % 3,
                "Signs",
            )
            .unwrap()
        })
        .collect();
    Arc::new(Quiz::new("permit-1", "Permit practice", questions, 75).unwrap())
}

fn service(repo: &InMemoryRepository, seed: u64) -> QuizLoopService {
    QuizLoopService::new(fixed_clock(), ProgressStore::new(Arc::new(repo.clone()))).with_seed(seed)
}

async fn answer(svc: &QuizLoopService, session: &mut QuizSession, correct: bool) -> Advance {
    let question = session.current_question().unwrap();
    let choice = if correct {
        question.correct_answer()
    } else {
        (question.correct_answer() + 1) % question.options().len()
    };
    svc.select_option(session, choice).await.unwrap();
    svc.reveal(session).await.unwrap();
    svc.next(session).await.unwrap()
}

#[tokio::test]
async fn three_of_four_correct_passes_at_75() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo, 7);
    let mut session = svc.start(permit_quiz()).await;

    for _ in 0..3 {
        assert!(matches!(answer(&svc, &mut session, true).await, Advance::Moved { .. }));
    }
    let Advance::Completed(result) = answer(&svc, &mut session, false).await else {
        panic!("expected completion");
    };

    assert_eq!(result.correct_answers, 3);
    assert_eq!(result.incorrect_answers, 1);
    assert_eq!(result.percentage, 75);
    assert_eq!(result.points(), 30);
    assert!(result.passed);

    let store = svc.progress_store();
    assert_eq!(store.load(&QuizId::new("permit-1")).await, None);
    assert_eq!(store.load_shuffle(&QuizId::new("permit-1")).await, None);
    assert_eq!(svc.history().await, vec![result]);
}

#[tokio::test]
async fn resume_keeps_order_pointer_and_answers() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo, 11);
    let mut first = svc.start(permit_quiz()).await;
    answer(&svc, &mut first, true).await;
    svc.select_option(&mut first, 0).await.unwrap();

    // A fresh service with a different seed must still see the saved order.
    let resumed = service(&repo, 99).start(permit_quiz()).await;

    assert_eq!(resumed.questions(), first.questions());
    assert_eq!(resumed.current_index(), 1);
    assert_eq!(resumed.answers(), first.answers());
    assert!(matches!(resumed.question_state(0), Some(QuestionState::Revealed(_))));
    assert_eq!(resumed.current_state(), Some(QuestionState::Answered(0)));
}

#[tokio::test]
async fn corrupt_progress_starts_fresh() {
    let repo = InMemoryRepository::new();
    repo.set("quiz-progress-permit-1", "{oops").await.unwrap();
    repo.set("quiz-shuffle-permit-1", "not json either").await.unwrap();

    let session = service(&repo, 3).start(permit_quiz()).await;

    assert_eq!(session.current_index(), 0);
    assert!(session.answers().is_empty());
    assert_eq!(session.questions().len(), 4);
}

#[tokio::test]
async fn edited_quiz_discards_saved_shuffle() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo, 5);
    let mut session = svc.start(permit_quiz()).await;
    svc.select_option(&mut session, 0).await.unwrap();

    let shorter = {
        let original = permit_quiz();
        Arc::new(
            Quiz::new(
                "permit-1",
                "Permit practice",
                original.questions()[..3].to_vec(),
                75,
            )
            .unwrap(),
        )
    };
    let restarted = svc.start(shorter).await;

    assert_eq!(restarted.questions().len(), 3);
    assert!(restarted.answers().is_empty());
}

#[tokio::test]
async fn restart_clears_answers_and_saves_new_attempt() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo, 21);
    let mut session = svc.start(permit_quiz()).await;
    answer(&svc, &mut session, true).await;

    svc.restart(&mut session).await;

    assert_eq!(session.current_index(), 0);
    assert!(session.answers().is_empty());
    let saved = svc.progress_store().load(&QuizId::new("permit-1")).await.unwrap();
    assert!(saved.answers.is_empty());
    assert_eq!(saved.current_question, 0);
}

#[tokio::test]
async fn rejected_transition_leaves_saved_state_alone() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo, 1);
    let mut session = svc.start(permit_quiz()).await;

    assert_eq!(svc.next(&mut session).await, Err(SessionError::NotRevealed));
    assert_eq!(svc.reveal(&mut session).await, Err(SessionError::NoSelection));
    let saved = svc.progress_store().load(&QuizId::new("permit-1")).await.unwrap();
    assert!(saved.answers.is_empty());
}

#[tokio::test]
async fn time_limit_finishes_attempt() {
    let repo = InMemoryRepository::new();
    let timed = Arc::new(Quiz::clone(&permit_quiz()).with_time_limit(5).unwrap());
    let store = ProgressStore::new(Arc::new(repo.clone()));

    let mut clock = fixed_clock();
    let mut session = QuizLoopService::new(clock, store.clone()).start(timed).await;
    let early = QuizLoopService::new(clock, store.clone());
    assert_eq!(early.finish_if_expired(&mut session).await, None);

    clock.advance(chrono::Duration::minutes(6));
    let late = QuizLoopService::new(clock, store);
    let result = late.finish_if_expired(&mut session).await.unwrap();
    assert_eq!(result.percentage, 0);
    assert!(session.is_complete());
    assert_eq!(result.completed_at, fixed_now() + chrono::Duration::minutes(6));
}

struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Connection("disk unplugged".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk unplugged".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk unplugged".into()))
    }
}

#[tokio::test]
async fn failing_store_never_fails_a_transition() {
    let svc = QuizLoopService::new(fixed_clock(), ProgressStore::new(Arc::new(BrokenStore)))
        .with_seed(2);
    let mut session = svc.start(permit_quiz()).await;

    let mut last = None;
    for _ in 0..4 {
        last = Some(answer(&svc, &mut session, true).await);
    }
    let Some(Advance::Completed(result)) = last else {
        panic!("expected completion");
    };
    assert_eq!(result.percentage, 100);
    assert!(svc.history().await.is_empty());
}
