// src/repository/memory.rs

//! In-process repositories with the same contracts as the Postgres ones.
//! Used by the test suites and for running the API without a database.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, Result},
    models::{
        progress::LearningProgress,
        question::QuizQuestion,
        quiz_session::{QuizAttempt, QuizSession},
    },
    repository::{ProgressRepository, QuizRepository},
};

#[derive(Default)]
pub struct MemoryQuizRepository {
    questions: RwLock<Vec<QuizQuestion>>,
    sessions: RwLock<HashMap<String, QuizSession>>,
    attempts: RwLock<Vec<QuizAttempt>>,
}

impl MemoryQuizRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions: RwLock::new(questions),
            ..Self::default()
        }
    }

    pub async fn attempt_count(&self) -> usize {
        self.attempts.read().await.len()
    }
}

#[async_trait]
impl QuizRepository for MemoryQuizRepository {
    async fn get_questions_by_chapter(&self, topic: &str, chapter: &str) -> Result<Vec<QuizQuestion>> {
        let mut items: Vec<QuizQuestion> = self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| q.topic == topic && q.chapter == chapter)
            .cloned()
            .collect();
        items.sort_by_key(|q| q.id);
        Ok(items)
    }

    async fn create_session(&self, mut session: QuizSession) -> Result<String> {
        if session.session_id.is_empty() {
            session.session_id = uuid::Uuid::new_v4().to_string();
        }
        let id = session.session_id.clone();
        self.sessions.write().await.insert(id.clone(), session);
        Ok(id)
    }

    /// All or nothing: one already answered (session, question) pair rejects the batch.
    async fn save_attempts(&self, attempts: &[QuizAttempt]) -> Result<()> {
        let mut stored = self.attempts.write().await;
        let mut answered: HashSet<(String, i64)> = stored
            .iter()
            .map(|a| (a.session_id.clone(), a.question_id))
            .collect();
        if !attempts
            .iter()
            .all(|a| answered.insert((a.session_id.clone(), a.question_id)))
        {
            return Err(AppError::DuplicateSubmit);
        }
        stored.extend_from_slice(attempts);
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<QuizSession>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn update_session_result(
        &self,
        session_id: &str,
        correct: i32,
        score: i32,
        passed: bool,
    ) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) if session.completed_at.is_none() => {
                session.correct_answers = correct;
                session.score = score;
                session.passed = passed;
                session.completed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_history(&self, user_id: i64, topic: &str, limit: i64) -> Result<Vec<QuizSession>> {
        let mut items: Vec<QuizSession> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id && s.completed_at.is_some())
            .filter(|s| topic.is_empty() || s.topic == topic)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    async fn get_attempts_by_session(&self, session_id: &str) -> Result<Vec<QuizAttempt>> {
        Ok(self
            .attempts
            .read()
            .await
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryProgressRepository {
    records: RwLock<HashMap<(i64, String, String), LearningProgress>>,
}

impl MemoryProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut items: Vec<LearningProgress>) -> Vec<LearningProgress> {
        items.sort_by(|a, b| b.last_visit_at.cmp(&a.last_visit_at));
        items
    }
}

#[async_trait]
impl ProgressRepository for MemoryProgressRepository {
    async fn create_or_update(&self, record: &LearningProgress) -> Result<()> {
        let key = (record.user_id, record.topic.clone(), record.chapter.clone());
        self.records.write().await.insert(key, record.clone());
        Ok(())
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Vec<LearningProgress>> {
        let items = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(Self::sorted(items))
    }

    async fn get_by_topic(&self, user_id: i64, topic: &str) -> Result<Vec<LearningProgress>> {
        let items = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id && r.topic == topic)
            .cloned()
            .collect();
        Ok(Self::sorted(items))
    }

    async fn get(&self, user_id: i64, topic: &str, chapter: &str) -> Result<Option<LearningProgress>> {
        let key = (user_id, topic.to_string(), chapter.to_string());
        Ok(self.records.read().await.get(&key).cloned())
    }
}
