//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use yarnhue_core::{ColorError, MatcherError, ReferenceError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A status code plus a message, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<MatcherError> for ApiError {
    fn from(e: MatcherError) -> Self {
        let status = match &e {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            MatcherError::Color(ColorError::InvalidThreshold(_)) => StatusCode::BAD_REQUEST,
            MatcherError::Reference(ReferenceError::Color(ColorError::Decode(_))) => {
                StatusCode::BAD_REQUEST
            }
            MatcherError::Reference(ReferenceError::Color(ColorError::NoDominantColor)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %e, "Request failed");
        }
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
