//! Search and shared queue route handlers
//!
//! - `GET /search?q=` - Resolve a track name to its URI
//! - `POST /queue` - Relay an enqueue request to the caller's room
//! - `POST /queue/search` - Search by name, then relay the first match

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::Session;
use crate::state::AppState;

pub fn search_router(state: AppState) -> Router {
    Router::new().route("/", get(search)).with_state(state)
}

pub fn queue_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(enqueue))
        .route("/search", post(enqueue_by_name))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub track_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    pub track_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueByNameRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub room_name: String,
    pub track_uri: String,
    pub delivered: usize,
}

async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let track_uri = state
        .playback
        .resolve_track(auth.access_token(), &params.q)
        .await?;
    Ok(Json(SearchResponse { track_uri }))
}

async fn enqueue(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<EnqueueRequest>,
) -> ApiResult<Json<EnqueueResponse>> {
    let track_uri = body.track_uri.trim();
    if track_uri.is_empty() {
        return Err(ApiError::ValidationError("trackUri is required".to_string()));
    }
    relay(&state, &auth.session, track_uri.to_string())
}

async fn enqueue_by_name(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<EnqueueByNameRequest>,
) -> ApiResult<Json<EnqueueResponse>> {
    let room_name = auth.session.room.clone().ok_or(ApiError::NotInRoom)?;
    let track_uri = state
        .playback
        .resolve_track(auth.access_token(), &body.name)
        .await?;

    tracing::debug!(room = %room_name, track_uri = %track_uri, "Resolved enqueue request by name");
    relay(&state, &auth.session, track_uri)
}

/// Hand the request to the room; the host's socket does the enqueue
fn relay(state: &AppState, session: &Session, track_uri: String) -> ApiResult<Json<EnqueueResponse>> {
    let room_name = session.room.clone().ok_or(ApiError::NotInRoom)?;
    let delivered = state.broadcaster.request_enqueue(&room_name, &track_uri);

    Ok(Json(EnqueueResponse {
        room_name,
        track_uri,
        delivered,
    }))
}
