use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quiz_core::model::QuizId;

use super::service::{LeaderboardService, LeaderboardView};

/// Sidebar-style leaderboard that only delivers the latest refresh.
///
/// Each `refresh` takes a ticket when called. A refresh that completes after a
/// newer refresh or a `cancel` resolves to `None`.
#[derive(Clone)]
pub struct LeaderboardFeed {
    service: LeaderboardService,
    generation: Arc<AtomicU64>,
}

impl LeaderboardFeed {
    #[must_use]
    pub fn new(service: LeaderboardService) -> Self {
        Self {
            service,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn refresh(
        &self,
        quiz_id: QuizId,
    ) -> impl Future<Output = Option<LeaderboardView>> + Send + 'static {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let service = self.service.clone();

        async move {
            let view = service.view(&quiz_id).await;
            if generation.load(Ordering::SeqCst) == ticket {
                Some(view)
            } else {
                tracing::debug!(%quiz_id, ticket, "discarding superseded leaderboard refresh");
                None
            }
        }
    }

    /// Abandon any refresh in flight, e.g. when the view goes away.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
