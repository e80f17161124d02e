//! Mapping from service errors to JSON error responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use services::{DrillError, ProgressError, TutorError, UserServiceError};

/// Body returned for every failure that is not the client's fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "Failed to process request";

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(&'static str),
    NotFound(String),
    Conflict(String),
    /// Detail is logged, never returned.
    Internal(String),
}

impl AppError {
    fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Invalid(e) => AppError::BadRequest(e.to_string()),
            UserServiceError::AlreadyRegistered => AppError::Conflict(err.to_string()),
            UserServiceError::NotFound(_) => AppError::NotFound(err.to_string()),
            other => AppError::internal(other),
        }
    }
}

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::UserNotFound(_) | ProgressError::NoOpenSession(_) => {
                AppError::NotFound(err.to_string())
            }
            other => AppError::internal(other),
        }
    }
}

impl From<TutorError> for AppError {
    fn from(err: TutorError) -> Self {
        match err {
            TutorError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            TutorError::EmptyConversation => AppError::BadRequest(err.to_string()),
            TutorError::Progress(inner) => inner.into(),
            other => AppError::internal(other),
        }
    }
}

impl From<DrillError> for AppError {
    fn from(err: DrillError) -> Self {
        match err {
            DrillError::UnknownSubject(_) => AppError::NotFound(err.to_string()),
            DrillError::MissingField(_) => AppError::BadRequest(err.to_string()),
            other => AppError::internal(other),
        }
    }
}
