//! Server error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors returned by the API handlers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// No session is tracked under this Call-ID.
    #[error("call not found: {0}")]
    CallNotFound(String),

    /// The capture process could not be started.
    #[error("failed to start capture: {0}")]
    CaptureStart(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::CallNotFound(_) => StatusCode::NOT_FOUND,
            Self::CaptureStart(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
