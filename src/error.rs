// src/error.rs

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Why a submission or query parameter was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    MissingField,
    InvalidRange,
    InvalidFormat,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationReason::MissingField => "is required",
            ValidationReason::InvalidRange => "is out of range",
            ValidationReason::InvalidFormat => "is malformed",
        };
        f.write_str(text)
    }
}

/// User-correctable input error. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    /// Wire name of the offending field (e.g. `totalQuestions`).
    pub field: &'static str,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

/// Failures of the score store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transient; the caller may retry with backoff. Upserts are idempotent per key.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Everything a leaderboard operation can return instead of a result.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    /// The caller's deadline expired. A submission may or may not have been
    /// stored, but if it was, it was stored whole.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The store broke its own contract (e.g. a committed entry is missing
    /// from the next read). Not retryable.
    #[error("store inconsistency: {0}")]
    Inconsistent(String),
}

/// Global Application Error Enum.
/// Maps core errors onto HTTP responses at the transport boundary.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 503 Service Unavailable (store down, retryable)
    ServiceUnavailable(String),

    // 504 Gateway Timeout (deadline exceeded)
    Timeout,
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
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage temporarily unavailable, please retry".to_string(),
                )
            }
            AppError::Timeout => {
                tracing::warn!("Request deadline exceeded");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Request timed out".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<LeaderboardError> for AppError {
    fn from(err: LeaderboardError) -> Self {
        match err {
            LeaderboardError::Validation(e) => AppError::BadRequest(e.to_string()),
            LeaderboardError::Storage(StoreError::Unavailable(msg)) => {
                AppError::ServiceUnavailable(msg)
            }
            LeaderboardError::DeadlineExceeded => AppError::Timeout,
            LeaderboardError::Inconsistent(msg) => AppError::InternalServerError(msg),
        }
    }
}

/// Malformed or mistyped JSON bodies get the same `{"error"}` body as validation failures.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
