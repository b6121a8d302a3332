mod feed;
mod http;
mod service;

pub use crate::error::{HttpLeaderboardError, LeaderboardError};
pub use feed::LeaderboardFeed;
pub use http::{HttpLeaderboardRepository, LeaderboardHttpConfig};
pub use service::{LeaderboardService, LeaderboardView, RankedEntry};
