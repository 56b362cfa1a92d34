// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Result alias for operations against the comment store.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the relation store, page assembler, traversal engine
/// and mutation service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A page, comment or subtree root has no rows.
    #[error("{0} not found")]
    NotFound(String),

    /// The child already has a parent edge.
    #[error("comment {0} already has a relation")]
    DuplicateRelation(i64),

    /// The referenced parent does not exist (or lives on another page).
    #[error("invalid parent comment {0}")]
    InvalidParent(i64),

    /// A relation depth that does not continue its parent's depth.
    #[error("invalid depth {got} for comment {child}, expected {expected}")]
    InvalidDepth { child: i64, expected: i64, got: i64 },

    #[error("user {email} ({provider}) not found")]
    UserNotFound { email: String, provider: String },

    #[error("page {0} not found")]
    PageNotFound(String),

    #[error("page {0} already exists")]
    DuplicatePage(String),

    /// The request carries no snapshot instant.
    #[error("missing snapshot instant")]
    MissingSnapshot,

    /// Underlying I/O or transaction failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn not_found(what: impl fmt::Display) -> Self {
        StoreError::NotFound(what.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::UserNotFound { .. } | StoreError::PageNotFound(_)
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Storage(err.to_string())
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate relation)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_)
            | StoreError::UserNotFound { .. }
            | StoreError::PageNotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::DuplicateRelation(_) | StoreError::DuplicatePage(_) => {
                AppError::Conflict(err.to_string())
            }
            StoreError::InvalidParent(_) | StoreError::InvalidDepth { .. } => {
                AppError::BadRequest(err.to_string())
            }
            StoreError::MissingSnapshot | StoreError::Storage(_) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}
