// src/repository/mod.rs

//! Persistence seams. Services only see these traits; storage errors come
//! back as `AppError::Database` and are never retried here.

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{
        progress::LearningProgress,
        question::QuizQuestion,
        quiz_session::{QuizAttempt, QuizSession},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryProgressRepository, MemoryQuizRepository};
pub use postgres::{PgProgressRepository, PgQuizRepository};

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Questions of one chapter, ordered by id.
    async fn get_questions_by_chapter(&self, topic: &str, chapter: &str) -> Result<Vec<QuizQuestion>>;

    /// Stores a new session and returns its id. A blank `session_id` gets a fresh UUID.
    async fn create_session(&self, session: QuizSession) -> Result<String>;

    /// Writes all attempts of one submission, all or nothing.
    async fn save_attempts(&self, attempts: &[QuizAttempt]) -> Result<()>;

    async fn get_session(&self, session_id: &str) -> Result<Option<QuizSession>>;

    /// Attaches the result and marks the session completed.
    ///
    /// Only applies to a session that is not completed yet; returns `false`
    /// when nothing was updated.
    async fn update_session_result(
        &self,
        session_id: &str,
        correct: i32,
        score: i32,
        passed: bool,
    ) -> Result<bool>;

    /// Completed sessions, newest first. An empty topic means all topics.
    async fn get_history(&self, user_id: i64, topic: &str, limit: i64) -> Result<Vec<QuizSession>>;

    async fn get_attempts_by_session(&self, session_id: &str) -> Result<Vec<QuizAttempt>>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Upsert keyed by (user, topic, chapter).
    async fn create_or_update(&self, record: &LearningProgress) -> Result<()>;

    /// All chapters of a user, most recently visited first.
    async fn get_by_user(&self, user_id: i64) -> Result<Vec<LearningProgress>>;

    async fn get_by_topic(&self, user_id: i64, topic: &str) -> Result<Vec<LearningProgress>>;

    async fn get(&self, user_id: i64, topic: &str, chapter: &str) -> Result<Option<LearningProgress>>;
}
