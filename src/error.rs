// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::models::level::Level;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (malformed DTOs, failed field validation)
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found (also covers ownership failures on attempt lookup)
    NotFound(String),

    // 422: the bank holds fewer questions than the requested sample size
    InsufficientQuestions {
        level: Level,
        available: i64,
        required: i64,
    },

    // 422: level outside the five-tier enum
    InvalidLevel(String),

    // 422: zero submitted answers
    EmptyAnswers,

    // 422: submitted question id missing from the bank
    UnknownQuestion(i64),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_server_error" }),
                )
            }
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "bad_request", "detail": msg }),
            ),
            AppError::AuthError(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthorized", "detail": msg }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "detail": msg }),
            ),
            AppError::InsufficientQuestions {
                level,
                available,
                required,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "insufficient_questions",
                    "level": level,
                    "available": available,
                    "required": required,
                }),
            ),
            AppError::InvalidLevel(value) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "invalid_level", "detail": value }),
            ),
            AppError::EmptyAnswers => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "empty_answers" }),
            ),
            AppError::UnknownQuestion(id) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "unknown_question", "question_id": id }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
