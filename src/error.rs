//! Error types and Axum response conversions.

use crate::models::BlobError;
use crate::storage::StorageError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error returned by every handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request body or path is not acceptable.
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// No valid session. Carries no detail on purpose.
    #[error("Unauthorized")]
    Unauthorized,
    /// Authenticated, but not allowed on this surface.
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Missing, or owned by someone else.
    #[error("Not found: {0}")]
    NotFound(String),
    /// A uniqueness rule rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Anything the caller cannot fix.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias for handlers and services.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict => AppError::Conflict("Already exists".to_string()),
            err => AppError::Internal(err.to_string()),
        }
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        AppError::Internal(err.to_string())
    }
}

// Extractor rejections answer with the same JSON body as every other error.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {rejection}"))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(format!("Invalid path: {rejection}"))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query string: {rejection}"))
    }
}
