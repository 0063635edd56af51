//! Error handling module for the PRFlow backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and
//! response envelopes. Every failure maps to exactly one kind plus a
//! human-readable message; handlers never invent ad-hoc error shapes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const TEAM_EXISTS: &str = "TEAM_EXISTS";
    pub const PR_EXISTS: &str = "PR_EXISTS";
    pub const PR_MERGED: &str = "PR_MERGED";
    pub const NOT_ASSIGNED: &str = "NOT_ASSIGNED";
    pub const NO_CANDIDATE: &str = "NO_CANDIDATE";
    pub const INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
///
/// `AlreadyExists` and `Conflict` carry a stable machine code alongside the
/// message so the boundary can distinguish, e.g., a merged-PR conflict from a
/// no-candidate conflict without string matching.
#[derive(Debug)]
pub enum AppError {
    /// Referenced entity absent
    NotFound(String),
    /// Identity collision on create
    AlreadyExists {
        code: &'static str,
        message: String,
    },
    /// State-incompatible request
    Conflict {
        code: &'static str,
        message: String,
    },
    /// Malformed or incomplete request payload
    Validation(String),
    /// Database error
    Database(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    pub fn team_exists() -> Self {
        AppError::AlreadyExists {
            code: codes::TEAM_EXISTS,
            message: "team already exists".to_string(),
        }
    }

    pub fn pr_exists() -> Self {
        AppError::AlreadyExists {
            code: codes::PR_EXISTS,
            message: "PR id already exists".to_string(),
        }
    }

    pub fn pr_merged() -> Self {
        AppError::Conflict {
            code: codes::PR_MERGED,
            message: "cannot reassign on merged PR".to_string(),
        }
    }

    pub fn not_assigned() -> Self {
        AppError::Conflict {
            code: codes::NOT_ASSIGNED,
            message: "reviewer is not assigned to this PR".to_string(),
        }
    }

    pub fn no_candidate() -> Self {
        AppError::Conflict {
            code: codes::NO_CANDIDATE,
            message: "no active replacement candidate in team".to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists { .. } => StatusCode::CONFLICT,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::AlreadyExists { code, .. } => code,
            AppError::Conflict { code, .. } => code,
            AppError::Validation(_) => codes::INVALID_PAYLOAD,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound(msg) => msg,
            AppError::AlreadyExists { message, .. } => message,
            AppError::Conflict { message, .. } => message,
            AppError::Validation(msg) => msg,
            AppError::Database(msg) => msg,
            AppError::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message().to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
