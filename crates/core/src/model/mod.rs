mod answers;
mod ids;
mod leaderboard;
mod question;
mod quiz;
mod result;
mod shuffled;

pub use answers::AnswerSheet;
pub use ids::{EntryId, ParseIdError, QuestionId, QuizId};
pub use leaderboard::{
    LeaderboardEntry, LeaderboardStats, LeaderboardSubmission, MAX_EMAIL_LEN, MAX_NAME_LEN,
    SubmissionError, compare_rank, rank_entries,
};
pub use question::{Difficulty, Question, QuestionDraft, QuestionError};
pub use quiz::{Quiz, QuizDraft, QuizError};
pub use result::{AnswerRecord, POINTS_PER_CORRECT_ANSWER, QuizResult};
pub use shuffled::ShuffledQuestion;
