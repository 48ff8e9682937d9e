//! HTTP route handlers for the Tandem API
//!
//! This module contains all REST endpoint handlers including:
//! - Provider login and session endpoints
//! - Playback control and drift correction
//! - Room membership, roles and host broadcast
//! - Track search and the shared queue relay
//! - Health check and status endpoints

pub mod auth;
pub mod health;
pub mod playback;
pub mod queue;
pub mod room;

use axum::{extract::Extension, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use auth::auth_router;
pub use health::health_router;
pub use playback::playback_router;
pub use queue::{queue_router, search_router};
pub use room::room_router;

use crate::state::AppState;
use crate::websocket::ws_handler;

/// Assemble the full application router
///
/// CORS is left to the binary so tests can drive the router directly.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler).with_state(state.clone()))
        .nest("/auth", auth_router(state.clone()))
        .nest("/playback", playback_router(state.clone()))
        .nest("/room", room_router(state.clone()))
        .nest("/search", search_router(state.clone()))
        .nest("/queue", queue_router(state.clone()))
        .nest("/health", health_router(state.clone()))
        // Extractors read the state from request extensions
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
    "Tandem - listen along with your friends"
}
