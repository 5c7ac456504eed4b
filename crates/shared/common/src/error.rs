//! Unified error handling for the authentication flows.
//!
//! Provides a single error type that carries the failure taxonomy of the
//! auth service and can be converted to Axum HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Message shared by every failed login, whatever the cause.
pub const AUTHENTICATION_FAILED_MESSAGE: &str = "Invalid email or password. Please try again.";

/// Message shared by every rejected refresh token, whatever the cause.
pub const INVALID_REFRESH_TOKEN_MESSAGE: &str = "Invalid or expired refresh token";

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Input
    #[error("{0}")]
    Validation(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    // Credentials & tokens
    #[error("{}", AUTHENTICATION_FAILED_MESSAGE)]
    AuthenticationFailed,

    #[error("{}", INVALID_REFRESH_TOKEN_MESSAGE)]
    InvalidRefreshToken,

    #[error("Refresh token was already used")]
    ConcurrencyConflict,

    #[error("Integrity error: {0}")]
    IntegrityError(String),

    #[error("Invalid token")]
    InvalidToken,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            AppError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AppError::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            AppError::IntegrityError(_) => "INTEGRITY_ERROR",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::NotFound => "NOT_FOUND",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyExists(_) | AppError::ConcurrencyConflict => StatusCode::CONFLICT,
            AppError::AuthenticationFailed
            | AppError::InvalidRefreshToken
            | AppError::IntegrityError(_)
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Show full message for client errors
            AppError::Validation(msg) => msg.clone(),
            AppError::AlreadyExists(msg) => {
                if msg.ends_with("already exists") {
                    msg.clone()
                } else {
                    format!("{} already exists", msg)
                }
            }

            // Orphaned tokens look like any other rejected token to the client
            AppError::IntegrityError(detail) => {
                tracing::warn!("Integrity error: {}", detail);
                INVALID_REFRESH_TOKEN_MESSAGE.to_string()
            }

            // Hide details for internal errors
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Use default message for others
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn already_exists(entity: impl Into<String>) -> Self {
        AppError::AlreadyExists(entity.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        AppError::IntegrityError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
