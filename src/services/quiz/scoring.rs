// src/services/quiz/scoring.rs

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    models::question::QuestionKind,
    services::quiz::{normalizer::normalize_choices, question_manager::PreparedQuestion},
};

/// Minimum percentage required to pass a chapter quiz.
pub const PASSING_SCORE: i32 = 60;

/// Per-question grading feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub is_correct: bool,
    pub correct_answers: Vec<String>,
    pub explanation: String,
    /// Credit in `[0.0, 1.0]`.
    pub score_part: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub score: i32,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub passed: bool,
    pub details: Vec<AnswerDetail>,
}

/// Grades every question, using the number of questions as the denominator.
pub fn evaluate(
    questions: &[PreparedQuestion],
    answers: &HashMap<i64, Vec<String>>,
) -> ScoringResult {
    if questions.is_empty() {
        return ScoringResult::default();
    }
    let details = questions
        .iter()
        .map(|q| {
            let given = answers.get(&q.view.id).map(Vec::as_slice).unwrap_or(&[]);
            grade_question(q, given)
        })
        .collect();
    summarize(details, questions.len() as i32)
}

/// Grades against an authoritative total, e.g. the session's question count.
///
/// Questions without a submitted answer are recorded as zero-credit details.
pub fn evaluate_with_total(
    questions: &[PreparedQuestion],
    answers: &HashMap<i64, Vec<String>>,
    total: i32,
) -> ScoringResult {
    if total <= 0 {
        return ScoringResult::default();
    }
    let details = questions
        .iter()
        .map(|q| match answers.get(&q.view.id) {
            Some(given) => grade_question(q, given),
            None => AnswerDetail {
                question_id: q.view.id,
                is_correct: false,
                correct_answers: q.correct_answers.clone(),
                explanation: q.explanation.clone(),
                score_part: 0.0,
            },
        })
        .collect();
    summarize(details, total)
}

fn grade_question(question: &PreparedQuestion, given: &[String]) -> AnswerDetail {
    let correct = normalize_choices(&question.correct_answers);
    let given = normalize_choices(given);
    let part = credit(question.kind, &correct, &given);
    AnswerDetail {
        question_id: question.view.id,
        is_correct: part >= 1.0,
        correct_answers: correct,
        explanation: question.explanation.clone(),
        score_part: part,
    }
}

/// Credit for one question; both slices must already be normalized.
pub fn credit(kind: QuestionKind, correct: &[String], given: &[String]) -> f64 {
    if correct.is_empty() {
        return 0.0;
    }
    if kind.is_multi_select() {
        partial_credit(correct, given)
    } else if correct == given {
        1.0
    } else {
        0.0
    }
}

/// Any pick outside the correct set voids the question; otherwise credit is
/// the covered fraction of the correct set.
fn partial_credit(correct: &[String], given: &[String]) -> f64 {
    if given.is_empty() {
        return 0.0;
    }
    let expected: HashSet<&str> = correct.iter().map(String::as_str).collect();
    if given.iter().any(|g| !expected.contains(g.as_str())) {
        return 0.0;
    }
    let hits: HashSet<&str> = given.iter().map(String::as_str).collect();
    hits.len() as f64 / expected.len() as f64
}

fn summarize(details: Vec<AnswerDetail>, total: i32) -> ScoringResult {
    let credits: f64 = details.iter().map(|d| d.score_part).sum();
    let correct_answers = details.iter().filter(|d| d.is_correct).count() as i32;
    let score = ((credits / total as f64) * 100.0).round().clamp(0.0, 100.0) as i32;
    ScoringResult {
        score,
        total_questions: total,
        correct_answers,
        passed: score >= PASSING_SCORE,
        details,
    }
}
