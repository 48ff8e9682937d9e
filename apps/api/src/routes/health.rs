//! Health check HTTP route handlers
//!
//! - `GET /health` - Simple liveness check (returns 200 OK)
//! - `GET /health/live` - Liveness probe with version
//! - `GET /health/ready` - In-memory state summary

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Create health check router
pub fn health_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(simple_health))
        .route("/live", get(liveness_probe))
        .route("/ready", get(readiness_probe))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub connections: usize,
    pub rooms: usize,
}

/// Simple health check - always returns OK if the server is running
async fn simple_health() -> &'static str {
    "OK"
}

/// Liveness probe
///
/// Returns 200 if the server process is running and can handle requests.
async fn liveness_probe() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe with a count of live sessions, sockets and rooms
///
/// There are no external stores to check; the provider is only reached
/// on behalf of a listener.
async fn readiness_probe(State(state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready",
        sessions: state.sessions.len(),
        connections: state.rooms.connection_count(),
        rooms: state.rooms.room_count(),
    })
}
