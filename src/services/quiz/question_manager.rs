// src/services/quiz/question_manager.rs

use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::question::{OptionView, QuestionKind, QuestionView, QuizQuestion},
    services::quiz::normalizer::normalize_choices,
};

/// A question ready for grading, paired with its client view.
#[derive(Debug, Clone)]
pub struct PreparedQuestion {
    pub view: QuestionView,
    pub kind: QuestionKind,
    /// Normalized correct labels.
    pub correct_answers: Vec<String>,
    pub explanation: String,
}

/// One element of a stored answer list: an explicit label or a 0-based option index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum AnswerToken {
    Label(String),
    Index(u32),
    /// Indices written as floats (`1.0`) are truncated; negatives are dropped.
    Number(f64),
}

impl AnswerToken {
    fn into_label(self) -> String {
        match self {
            AnswerToken::Label(label) => label,
            AnswerToken::Index(idx) => option_label(idx as usize),
            AnswerToken::Number(n) if n.is_finite() && n >= 0.0 => option_label(n as usize),
            AnswerToken::Number(_) => String::new(),
        }
    }
}

/// `0 -> A, 1 -> B, ...`
pub fn option_label(idx: usize) -> String {
    char::from_u32('A' as u32 + idx as u32)
        .map(String::from)
        .unwrap_or_default()
}

/// Inverse of [`option_label`] for single-letter labels.
pub fn label_index(label: &str) -> Option<usize> {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c as usize - 'A' as usize),
        _ => None,
    }
}

/// Turns stored question records into grading input and client views.
///
/// Returns `(prepared, views)`; the views carry no answer data, so they can be
/// released to a client before grading.
pub fn prepare(records: &[QuizQuestion]) -> Result<(Vec<PreparedQuestion>, Vec<QuestionView>)> {
    if records.is_empty() {
        return Err(AppError::QuizUnavailable);
    }

    let mut prepared = Vec::with_capacity(records.len());
    let mut views = Vec::with_capacity(records.len());
    for record in records {
        let options = parse_options(&record.options)?;
        let correct_answers = parse_answers(&record.correct_answers)?;
        if correct_answers.is_empty() {
            return Err(AppError::MissingAnswer(record.id));
        }

        let view = QuestionView {
            id: record.id,
            question_type: record.question_type.clone(),
            difficulty: record.difficulty.clone(),
            question: record.question.clone(),
            options,
            code_snippet: record.code_snippet.clone(),
        };
        views.push(view.clone());
        prepared.push(PreparedQuestion {
            view,
            kind: QuestionKind::parse(&record.question_type),
            correct_answers,
            explanation: record.explanation.clone(),
        });
    }
    Ok((prepared, views))
}

/// Decodes the stored option texts. Options keep their declaration order.
pub fn parse_options(raw: &str) -> Result<Vec<OptionView>> {
    let texts: Vec<String> = serde_json::from_str(raw)?;
    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(idx, label)| OptionView {
            id: option_label(idx),
            label,
        })
        .collect())
}

/// Decodes a stored answer list into normalized letter labels.
pub fn parse_answers(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let tokens: Vec<AnswerToken> = serde_json::from_str(raw)?;
    let labels: Vec<String> = tokens.into_iter().map(AnswerToken::into_label).collect();
    Ok(normalize_choices(&labels))
}
