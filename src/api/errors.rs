use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::attempt_start::StartAttemptError;
use crate::services::attempt_submit::SubmitError;
use crate::services::mark_sync::SyncError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::NoActiveAttempt => ApiError::NotFound(err.to_string()),
            SubmitError::AlreadyCompleted => ApiError::Conflict(err.to_string()),
            SubmitError::NoValidAnswers => ApiError::BadRequest(err.to_string()),
            SubmitError::Unavailable(reason) => ApiError::Forbidden(reason.message()),
            SubmitError::Database(err) => ApiError::internal(err, "Failed to submit attempt"),
        }
    }
}

impl From<StartAttemptError> for ApiError {
    fn from(err: StartAttemptError) -> Self {
        match err {
            StartAttemptError::QuizNotFound => ApiError::NotFound(err.to_string()),
            StartAttemptError::Unavailable(reason) => ApiError::Forbidden(reason.message()),
            StartAttemptError::NotEnrolled => {
                ApiError::Forbidden("You are not enrolled in the course for this quiz")
            }
            StartAttemptError::AlreadyCompleted => ApiError::Conflict(err.to_string()),
            StartAttemptError::Database(err) => ApiError::internal(err, "Failed to start attempt"),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::AttemptNotFound => ApiError::NotFound(err.to_string()),
            SyncError::NotCompleted => ApiError::Conflict(err.to_string()),
            SyncError::NotEligible => ApiError::BadRequest(err.to_string()),
            SyncError::Analyzer(err) => ApiError::internal(err, "Failed to sync marks"),
            SyncError::Database(err) => ApiError::internal(err, "Failed to sync marks"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response = (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
        }
    }
}
