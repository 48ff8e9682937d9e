//! Playback control route handlers
//!
//! All commands run against the caller's own provider credentials.
//! - `POST /playback/play`, `/pause`, `/next`, `/previous`
//! - `GET /playback/current` - Snapshot of the caller's player
//! - `POST /playback/sync` - Correct the caller's player against a host snapshot

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::PlaybackSnapshot;
use crate::services::Correction;
use crate::state::AppState;

pub fn playback_router(state: AppState) -> Router {
    Router::new()
        .route("/play", post(play))
        .route("/pause", post(pause))
        .route("/next", post(next))
        .route("/previous", post(previous))
        .route("/current", get(current))
        .route("/sync", post(sync))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub track: String,
}

/// Resume playback and report what is playing
async fn play(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<PlayResponse>> {
    state.provider.play(auth.access_token(), None, None).await?;

    let track = state
        .playback
        .capture(auth.access_token())
        .await?
        .map(|s| s.track_name)
        .unwrap_or_else(|| "No track playing".to_string());

    Ok(Json(PlayResponse { track }))
}

async fn pause(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    state.provider.pause(auth.access_token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn next(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    state.provider.next(auth.access_token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn previous(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    state.provider.previous(auth.access_token()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's current snapshot, or `{"track": null}` when idle
async fn current(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Response> {
    let response = match state.playback.capture(auth.access_token()).await? {
        Some(snapshot) => Json(snapshot).into_response(),
        None => Json(serde_json::json!({ "track": null })).into_response(),
    };
    Ok(response)
}

/// Apply the drift correction for a host snapshot and report it
///
/// A capture time in the future is pulled back to now, so a bad client
/// clock cannot shadow the snapshots that follow it.
async fn sync(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut host): Json<PlaybackSnapshot>,
) -> ApiResult<Json<Correction>> {
    host.captured_at_ms = host.captured_at_ms.min(Utc::now().timestamp_millis());
    let correction = state.playback.sync_to_host(auth.session.id, &host).await?;
    Ok(Json(correction))
}
