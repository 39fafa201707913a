// src/repository/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{
        progress::LearningProgress,
        question::QuizQuestion,
        quiz_session::{QuizAttempt, QuizSession},
    },
    repository::{ProgressRepository, QuizRepository},
};

#[derive(Clone)]
pub struct PgQuizRepository {
    pool: PgPool,
}

impl PgQuizRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizRepository for PgQuizRepository {
    async fn get_questions_by_chapter(&self, topic: &str, chapter: &str) -> Result<Vec<QuizQuestion>> {
        let questions = sqlx::query_as::<_, QuizQuestion>(
            r#"
            SELECT id, topic, chapter, type, difficulty, question, options,
                   correct_answers, explanation, code_snippet
            FROM quiz_questions
            WHERE topic = $1 AND chapter = $2
            ORDER BY id
            "#,
        )
        .bind(topic)
        .bind(chapter)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(topic, chapter, "Failed to fetch quiz questions: {:?}", e);
            e
        })?;

        Ok(questions)
    }

    async fn create_session(&self, session: QuizSession) -> Result<String> {
        let session_id = if session.session_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            session.session_id.clone()
        };

        sqlx::query(
            r#"
            INSERT INTO quiz_sessions
                (session_id, user_id, topic, chapter, total_questions,
                 correct_answers, score, passed, started_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&session_id)
        .bind(session.user_id)
        .bind(&session.topic)
        .bind(&session.chapter)
        .bind(session.total_questions)
        .bind(session.correct_answers)
        .bind(session.score)
        .bind(session.passed)
        .bind(session.started_at)
        .execute(&self.pool)
        .await?;

        Ok(session_id)
    }

    async fn save_attempts(&self, attempts: &[QuizAttempt]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for attempt in attempts {
            sqlx::query(
                r#"
                INSERT INTO quiz_attempts
                    (session_id, user_id, topic, chapter, question_id,
                     user_answers, is_correct, attempted_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(&attempt.session_id)
            .bind(attempt.user_id)
            .bind(&attempt.topic)
            .bind(&attempt.chapter)
            .bind(attempt.question_id)
            .bind(&attempt.user_answers)
            .bind(attempt.is_correct)
            .bind(attempt.attempted_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // another process already recorded this session
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return AppError::DuplicateSubmit;
                    }
                }
                AppError::Database(e)
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<QuizSession>> {
        let session = sqlx::query_as::<_, QuizSession>(
            r#"
            SELECT session_id, user_id, topic, chapter, total_questions,
                   correct_answers, score, passed, started_at, completed_at
            FROM quiz_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn update_session_result(
        &self,
        session_id: &str,
        correct: i32,
        score: i32,
        passed: bool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE quiz_sessions
            SET correct_answers = $2, score = $3, passed = $4, completed_at = NOW()
            WHERE session_id = $1 AND completed_at IS NULL
            "#,
        )
        .bind(session_id)
        .bind(correct)
        .bind(score)
        .bind(passed)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_history(&self, user_id: i64, topic: &str, limit: i64) -> Result<Vec<QuizSession>> {
        let sessions = sqlx::query_as::<_, QuizSession>(
            r#"
            SELECT session_id, user_id, topic, chapter, total_questions,
                   correct_answers, score, passed, started_at, completed_at
            FROM quiz_sessions
            WHERE user_id = $1
              AND completed_at IS NOT NULL
              AND ($2 = '' OR topic = $2)
            ORDER BY completed_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    async fn get_attempts_by_session(&self, session_id: &str) -> Result<Vec<QuizAttempt>> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(
            r#"
            SELECT session_id, user_id, topic, chapter, question_id,
                   user_answers, is_correct, attempted_at
            FROM quiz_attempts
            WHERE session_id = $1
            ORDER BY question_id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }
}

#[derive(Clone)]
pub struct PgProgressRepository {
    pool: PgPool,
}

impl PgProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROGRESS_COLUMNS: &str = "user_id, topic, chapter, status, read_duration, scroll_progress, \
     last_position, quiz_score, quiz_passed, first_visit_at, last_visit_at, completed_at";

#[async_trait]
impl ProgressRepository for PgProgressRepository {
    async fn create_or_update(&self, record: &LearningProgress) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO learning_progress
                (user_id, topic, chapter, status, read_duration, scroll_progress,
                 last_position, quiz_score, quiz_passed, first_visit_at, last_visit_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id, topic, chapter) DO UPDATE SET
                status = EXCLUDED.status,
                read_duration = EXCLUDED.read_duration,
                scroll_progress = EXCLUDED.scroll_progress,
                last_position = EXCLUDED.last_position,
                quiz_score = EXCLUDED.quiz_score,
                quiz_passed = EXCLUDED.quiz_passed,
                last_visit_at = EXCLUDED.last_visit_at,
                completed_at = EXCLUDED.completed_at
            "#,
        )
        .bind(record.user_id)
        .bind(&record.topic)
        .bind(&record.chapter)
        .bind(record.status.as_str())
        .bind(record.read_duration)
        .bind(record.scroll_progress)
        .bind(&record.last_position)
        .bind(record.quiz_score)
        .bind(record.quiz_passed)
        .bind(record.first_visit_at)
        .bind(record.last_visit_at)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                user_id = record.user_id,
                topic = %record.topic,
                chapter = %record.chapter,
                "Failed to upsert progress: {:?}",
                e
            );
            e
        })?;

        Ok(())
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Vec<LearningProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM learning_progress WHERE user_id = $1 ORDER BY last_visit_at DESC"
        );
        let records = sqlx::query_as::<_, LearningProgress>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn get_by_topic(&self, user_id: i64, topic: &str) -> Result<Vec<LearningProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM learning_progress \
             WHERE user_id = $1 AND topic = $2 ORDER BY last_visit_at DESC"
        );
        let records = sqlx::query_as::<_, LearningProgress>(&sql)
            .bind(user_id)
            .bind(topic)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn get(&self, user_id: i64, topic: &str, chapter: &str) -> Result<Option<LearningProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM learning_progress \
             WHERE user_id = $1 AND topic = $2 AND chapter = $3"
        );
        let record = sqlx::query_as::<_, LearningProgress>(&sql)
            .bind(user_id)
            .bind(topic)
            .bind(chapter)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }
}
