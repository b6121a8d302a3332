mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{NavigatorItem, SessionProgress};
pub use service::{Advance, QuestionState, QuizSession, SessionPhase};
pub use workflow::QuizLoopService;
