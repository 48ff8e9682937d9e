//! Middleware components for the Tandem API
//!
//! Authentication extractors for Axum handlers:
//! - `AuthUser`: Requires a valid session, returns 401 if missing/invalid
//! - `MaybeAuthUser`: Optional authentication, returns None if not authenticated

pub mod auth;

pub use auth::{extract_bearer_token, AuthRejection, AuthUser, MaybeAuthUser};
