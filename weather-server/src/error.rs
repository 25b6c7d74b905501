//! API error types.
//!
//! Maps the ingestion/storage taxonomy onto HTTP responses with JSON
//! bodies of the shape `{"error": "..."}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use weather_core::StoreError;

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request referenced a slug outside the configured location table.
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// The subject is valid but its partition has no entries yet.
    #[error("{0}")]
    NotFound(String),

    /// The reading store failed underneath a read.
    #[error("Failed to retrieve weather data: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidLocation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        tracing::warn!(status = %status, error = %body.error, "request failed");

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
