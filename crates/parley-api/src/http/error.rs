//! Application error type mapping to HTTP status codes and envelope format.

use axum::response::{IntoResponse, Response};

use super::response::{ApiResponse, RequestClock};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// The caller sent something the API refuses to process.
    Validation(String),
    /// No session with this id.
    SessionNotFound(String),
    /// Generic internal error.
    Internal(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Internal(msg) => msg.clone(),
            AppError::SessionNotFound(id) => format!("Session {id} not found"),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(msg) = &self {
            tracing::error!(error = %msg, "request failed");
        }
        let clock = RequestClock::start();
        ApiResponse::error(self.code(), &self.message(), clock.request_id, 0).into_response()
    }
}
