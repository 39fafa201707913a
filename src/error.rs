// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, AppError>;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed caller-supplied identifiers.
    #[error("invalid quiz or progress parameters: {0}")]
    InvalidInput(String),

    /// The chapter has no authored questions.
    #[error("no quiz is available for this chapter")]
    QuizUnavailable,

    /// The session is already graded, or grading is in flight.
    #[error("quiz session has already been submitted")]
    DuplicateSubmit,

    /// A serialized option or answer list could not be decoded.
    #[error("malformed question data: {0}")]
    QuestionFormat(#[from] serde_json::Error),

    #[error("question {0} has no correct answer")]
    MissingAnswer(i64),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Storage failures are carried through untouched.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        AppError::InvalidInput(reason.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::QuizUnavailable | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateSubmit => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::QuestionFormat(_)
            | AppError::MissingAnswer(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts the error into a JSON response with appropriate HTTP status code.
/// Server-side failures are logged and answered with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = if status.is_server_error() {
            tracing::error!("Internal Server Error: {}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_errors_map_to_client_statuses() {
        assert_eq!(
            AppError::invalid("topic").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::QuizUnavailable.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::DuplicateSubmit.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_errors_are_server_failures() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Database(sqlx::Error::PoolTimedOut)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
