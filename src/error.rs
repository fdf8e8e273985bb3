use axum::Json;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub mod error_codes {
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const ALREADY_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Every failure a call can surface. Each variant carries the message
/// returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub code: i32,
    pub kind: &'static str,
    pub error_message: String,
}

impl AppError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Logs the underlying cause and keeps only `context` for the caller.
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", context, err);
        Self::Internal(context.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::PermissionDenied(_) => "permission_denied",
            Self::AlreadyExists(_) => "already_exists",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(msg)
            | Self::Unauthenticated(msg)
            | Self::PermissionDenied(msg)
            | Self::AlreadyExists(msg)
            | Self::NotFound(msg)
            | Self::Internal(msg) => msg,
        }
    }

    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            Self::InvalidArgument(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED),
            Self::PermissionDenied(_) => (StatusCode::FORBIDDEN, error_codes::PERMISSION_DENIED),
            Self::AlreadyExists(_) => (StatusCode::CONFLICT, error_codes::ALREADY_EXISTS),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
        }
    }
}

/// Postgres unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Postgres foreign-key violation, e.g. a tracklist pointing at a deleted song.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Unreadable, untyped or mistyped request bodies.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidArgument(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = Json(ErrorResponse {
            code,
            kind: self.kind(),
            error_message: self.message().to_string(),
        });

        (status, body).into_response()
    }
}
