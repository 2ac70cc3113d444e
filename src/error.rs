use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::backend::BackendError;

/// Client-side checks on user input. Never reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter some content!")]
    EmptyContent,

    #[error("Please select at least one tag!")]
    NoTags,

    #[error("Content is too long! Maximum {max} characters.")]
    TooLong { max: usize },

    #[error("Please enter a username!")]
    EmptyUsername,
}

/// Failures of viewer actions (vote, save, post, report, ...).
#[derive(Debug, thiserror::Error)]
pub enum RoastrError {
    #[error("Not logged in")]
    Unauthenticated,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Backend error: {0}")]
    Transport(#[from] BackendError),

    #[error("Forbidden")]
    Forbidden,
}

pub type RoastrResult<T> = Result<T, RoastrError>;

/// Errors at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
