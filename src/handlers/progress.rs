// src/handlers/progress.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::progress::UpdateProgressRequest,
    services::progress::ProgressService,
    utils::jwt::Claims,
};

/// Records a reading visit (time, scroll depth, position) or a quiz outcome.
///
/// The user always comes from the token; a `user_id` in the body is ignored.
pub async fn update_progress(
    State(progress): State<Arc<ProgressService>>,
    Extension(claims): Extension<Claims>,
    Json(mut payload): Json<UpdateProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    payload.user_id = claims.user_id();

    let update = progress.create_or_update_progress(payload).await?;
    Ok(Json(update))
}

pub async fn get_overall_progress(
    State(progress): State<Arc<ProgressService>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let summary = progress.get_overall_progress(claims.user_id()).await?;
    Ok(Json(summary))
}

/// Suggests where to continue reading. `next` is null once every chapter is completed.
pub async fn get_next_chapter(
    State(progress): State<Arc<ProgressService>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let next = progress.get_next_unfinished_chapter(claims.user_id()).await?;
    Ok(Json(json!({ "next": next })))
}

pub async fn list_chapters(
    State(progress): State<Arc<ProgressService>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let chapters = progress.list_chapters(claims.user_id()).await?;
    Ok(Json(chapters))
}

pub async fn get_topic_progress(
    State(progress): State<Arc<ProgressService>>,
    Extension(claims): Extension<Claims>,
    Path(topic): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = progress.get_topic_progress(claims.user_id(), &topic).await?;
    Ok(Json(detail))
}
