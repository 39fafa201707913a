// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'quiz_questions' table in the database.
/// Authored content; never modified by the grading flow.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub topic: String,
    pub chapter: String,

    /// Question type: 'single', 'multiple' or 'code_correction'.
    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: String,

    /// 'easy', 'medium' or 'hard'.
    pub difficulty: String,

    /// The text content of the question.
    pub question: String,

    /// JSON array of option texts, e.g. `["stack", "heap"]`.
    pub options: String,

    /// JSON array mixing letter labels and 0-based indices, e.g. `["A", 2]`.
    pub correct_answers: String,

    pub explanation: String,

    pub code_snippet: Option<String>,
}

/// Grading rule selected from the stored type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Single,
    Multiple,
    CodeCorrection,
    /// Any other authored type; graded as an exact match.
    Other,
}

impl QuestionKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "single" => QuestionKind::Single,
            "multiple" => QuestionKind::Multiple,
            "code_correction" => QuestionKind::CodeCorrection,
            _ => QuestionKind::Other,
        }
    }

    /// Multi-select kinds earn proportional credit.
    pub fn is_multi_select(self) -> bool {
        matches!(self, QuestionKind::Multiple | QuestionKind::CodeCorrection)
    }
}

/// Option as shown to the client: `id` is the letter label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionView {
    pub id: String,
    pub label: String,
}

/// DTO for sending a question to the client (excludes answers and explanation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: String,
    pub difficulty: String,
    pub question: String,
    pub options: Vec<OptionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}
