//! Error handling for the Tandem API
//!
//! This module provides a unified error type using thiserror,
//! with automatic HTTP status code mapping via Axum's IntoResponse trait.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tandem_spotify_client::SpotifyError;
use thiserror::Error;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Main API error type
#[derive(Error, Debug)]
pub enum ApiError {
    // ========== Authentication & Authorization ==========
    /// No session, or the session holds no provider tokens
    #[error("User not authenticated")]
    Unauthorized,

    /// Invalid session token (expired, malformed, etc.)
    #[error("invalid authentication token: {0}")]
    InvalidToken(String),

    /// Caller's declared role does not allow the operation
    #[error("insufficient permissions: {0}")]
    Forbidden(String),

    // ========== Room Errors ==========
    /// Room-scoped action without a joined room
    #[error("not in a room")]
    NotInRoom,

    // ========== Validation Errors ==========
    /// Request validation failed
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Track search returned nothing
    #[error("no track found for '{0}'")]
    SearchNoResult(String),

    // ========== External Service Errors ==========
    /// Streaming provider call failed
    #[error("provider error: {0}")]
    Provider(#[from] SpotifyError),

    // ========== Internal Errors ==========
    /// Internal server error (catch-all for unexpected errors)
    #[error("internal server error: {0}")]
    Internal(String),

    /// JWT encoding/decoding error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 401 Unauthorized
            Self::Unauthorized | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            Self::SearchNoResult(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::NotInRoom => StatusCode::CONFLICT,

            // 400 Bad Request
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,

            // 502 Bad Gateway (provider errors)
            Self::Provider(_) => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            Self::Internal(_) | Self::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for client-side handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotInRoom => "NOT_IN_ROOM",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::SearchNoResult(_) => "SEARCH_NO_RESULT",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Jwt(_) => "JWT_ERROR",
        }
    }

    /// Log the error with appropriate severity based on status code
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Authorization error"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Client error"
            );
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let error_response = ErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => Self::Internal(err.to_string()),
        }
    }
}
