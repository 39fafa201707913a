// src/models/quiz_session.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::models::question::QuestionView;

/// Represents the 'quiz_sessions' table in the database.
/// Terminal once `completed_at` is set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizSession {
    pub session_id: String,
    pub user_id: i64,
    pub topic: String,
    pub chapter: String,
    /// Fixed at creation; the scoring denominator.
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score: i32,
    pub passed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new(user_id: i64, topic: &str, chapter: &str, total_questions: i32) -> Self {
        Self {
            session_id: String::new(),
            user_id,
            topic: topic.to_string(),
            chapter: chapter.to_string(),
            total_questions,
            correct_answers: 0,
            score: 0,
            passed: false,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Represents the 'quiz_attempts' table: one write-once row per (session, question).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub session_id: String,
    pub user_id: i64,
    pub topic: String,
    pub chapter: String,
    pub question_id: i64,
    /// Normalized answer labels.
    pub user_answers: Json<Vec<String>>,
    pub is_correct: bool,
    pub attempted_at: DateTime<Utc>,
}

/// A user's raw answer to one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub user_answers: Vec<String>,
}

impl AnswerSubmission {
    pub fn new<S: Into<String>>(question_id: i64, answers: impl IntoIterator<Item = S>) -> Self {
        Self {
            question_id,
            user_answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// DTO for submitting a quiz session.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    /// The session id received when the questions were issued.
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,

    #[validate(length(min = 1, max = 100))]
    pub answers: Vec<AnswerSubmission>,
}

/// Questions issued for a new session.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizSessionPayload {
    pub session_id: String,
    pub topic: String,
    pub chapter: String,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub topic: Option<String>,
    pub limit: Option<i64>,
}

/// Question bank distribution for one chapter.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QuizStats {
    pub total: usize,
    pub by_type: HashMap<String, usize>,
    pub by_difficulty: HashMap<String, usize>,
}

/// Post-submission review of a graded session.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizReview {
    pub session_id: String,
    pub topic: String,
    pub chapter: String,
    pub score: i32,
    pub passed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub items: Vec<ReviewItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewItem {
    pub question_id: i64,
    pub question: String,
    pub options: Vec<String>,
    /// Chosen options rendered as their text, comma separated.
    pub user_choice: String,
    pub correct_choice: String,
    pub is_correct: bool,
    pub explanation: String,
}
