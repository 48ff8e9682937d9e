//! Authentication extractors for Axum handlers
//!
//! This module provides Axum extractors for session authentication:
//! - `AuthUser`: Requires a valid session token, returns 401 if missing/invalid
//! - `MaybeAuthUser`: Optional authentication, returns None if not authenticated
//!
//! Both read [`AppState`] from the request extensions.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::middleware::{AuthUser, MaybeAuthUser};
//!
//! async fn protected_handler(auth: AuthUser) -> impl IntoResponse {
//!     format!("Session {}", auth.session.id)
//! }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ApiError, ErrorResponse};
use crate::models::Session;
use crate::state::AppState;

/// Authenticated session extractor - requires valid authentication
///
/// Returns 401 Unauthorized if no valid session token is present, or if the
/// session it names has ended.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The caller's session
    pub session: Session,
}

impl AuthUser {
    pub fn access_token(&self) -> &str {
        self.session.access_token()
    }
}

/// Optional authentication extractor
///
/// Returns `None` rather than rejecting when no valid session is found.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser {
    pub session: Option<Session>,
}

/// Authentication rejection types
#[derive(Debug)]
pub enum AuthRejection {
    /// Missing or invalid Authorization header
    MissingToken,
    /// Token is malformed or expired
    InvalidToken(String),
    /// Token is valid but the session is gone
    SessionEnded,
    /// Missing required services in request extensions
    MissingServices,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AuthRejection::MissingToken => {
                tracing::debug!("Authentication rejected: missing token");
                (StatusCode::UNAUTHORIZED, ApiError::Unauthorized)
            }
            AuthRejection::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "Authentication rejected: invalid token");
                (StatusCode::UNAUTHORIZED, ApiError::InvalidToken(reason))
            }
            AuthRejection::SessionEnded => {
                tracing::debug!("Authentication rejected: session ended");
                (StatusCode::UNAUTHORIZED, ApiError::Unauthorized)
            }
            AuthRejection::MissingServices => {
                tracing::error!("Authentication rejected: missing services in request extensions");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::Internal("Authentication services not configured".to_string()),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: error.error_code(),
            message: error.to_string(),
        });

        (status, body).into_response()
    }
}

/// Extract the bearer token from the Authorization header (scheme is case-insensitive)
pub fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;

    let mut pieces = value.split_whitespace();
    let scheme = pieces.next()?;
    let token = pieces.next()?;

    // Reject malformed values like "Bearer <token> <extra>"
    if pieces.next().is_some() {
        return None;
    }

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

        let state = parts
            .extensions
            .get::<AppState>()
            .ok_or(AuthRejection::MissingServices)?;

        let session = state.auth.verify_token(token).map_err(|e| match e {
            ApiError::Unauthorized => AuthRejection::SessionEnded,
            other => AuthRejection::InvalidToken(other.to_string()),
        })?;

        Ok(AuthUser { session })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_bearer_token(parts) else {
            return Ok(MaybeAuthUser { session: None });
        };

        let Some(state) = parts.extensions.get::<AppState>() else {
            tracing::warn!("AppState not in extensions for MaybeAuthUser");
            return Ok(MaybeAuthUser { session: None });
        };

        match state.auth.verify_token(token) {
            Ok(session) => Ok(MaybeAuthUser {
                session: Some(session),
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Token verification failed in MaybeAuthUser");
                Ok(MaybeAuthUser { session: None })
            }
        }
    }
}
