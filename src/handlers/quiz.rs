// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz_session::{HistoryParams, SubmitQuizRequest},
    services::quiz::QuizService,
    state::AppState,
    utils::jwt::Claims,
};

/// Issues a new quiz session for a chapter.
///
/// Returns the session id and the questions in random order, without answers.
pub async fn get_quiz(
    State(quiz): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Path((topic, chapter)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let payload = quiz
        .get_quiz_questions(claims.user_id(), &topic, &chapter)
        .await?;

    Ok(Json(payload))
}

/// Grades a session and feeds the outcome into the chapter's progress.
///
/// * 409 if the session was already graded or is being graded.
/// * A failed progress write is logged; the graded result is still returned.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((topic, chapter)): Path<(String, String)>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let user_id = claims.user_id();

    let result = state
        .quiz
        .submit_quiz(user_id, &payload.session_id, &topic, &chapter, &payload.answers)
        .await?;

    if let Err(e) = state
        .progress
        .record_quiz_result(user_id, &topic, &chapter, result.score, result.passed)
        .await
    {
        tracing::warn!(
            user_id,
            topic = %topic,
            chapter = %chapter,
            "Failed to record quiz result in progress: {}",
            e
        );
    }

    Ok(Json(result))
}

/// Completed sessions of the current user, newest first.
pub async fn get_history(
    State(quiz): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let history = quiz
        .get_quiz_history(claims.user_id(), params.topic.as_deref(), params.limit)
        .await?;

    Ok(Json(history))
}

pub async fn get_review(
    State(quiz): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let review = quiz.get_quiz_review(claims.user_id(), &session_id).await?;
    Ok(Json(review))
}

/// Public: question bank size of a chapter.
pub async fn get_stats(
    State(quiz): State<Arc<QuizService>>,
    Path((topic, chapter)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let stats = quiz.get_stats(&topic, &chapter).await?;
    Ok(Json(stats))
}
