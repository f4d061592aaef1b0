//! Application error types and Axum response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_core::{answers, RelayError};
use serde::Serialize;

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    /// Malformed client input, rendered as `{"error": ...}`.
    BadRequest(String),
    /// Service cannot answer, rendered as `{"response": ...}` so clients can display it.
    Unavailable(String),
}

impl From<RelayError> for AppError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::NotInitialized => AppError::Unavailable(answers::NOT_CONFIGURED.into()),
            other => {
                tracing::error!("Unexpected error: {}", other);
                AppError::Unavailable(answers::SERVER_ERROR.into())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct UnavailableResponse {
    response: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            AppError::Unavailable(response) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UnavailableResponse { response }),
            )
                .into_response(),
        }
    }
}
