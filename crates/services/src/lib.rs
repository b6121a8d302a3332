#![forbid(unsafe_code)]

pub mod error;
pub mod leaderboard;
pub mod progress_store;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{HttpLeaderboardError, LeaderboardError, SessionError};
pub use leaderboard::{
    HttpLeaderboardRepository, LeaderboardFeed, LeaderboardHttpConfig, LeaderboardService,
    LeaderboardView, RankedEntry,
};
pub use progress_store::{ProgressStore, SavedProgress};
pub use sessions::{
    Advance, NavigatorItem, QuestionState, QuizLoopService, QuizSession, SessionPhase,
    SessionProgress,
};
