//! Room route handlers
//!
//! - `POST /room/join` - Join a room, moving the caller's socket with it
//! - `POST /room/role` - Declare host, client or unassigned
//! - `POST /room/broadcast` - Host pushes its current playback to the room

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::ParticipantRole;
use crate::state::AppState;
use crate::websocket::sync::join_room;

pub fn room_router(state: AppState) -> Router {
    Router::new()
        .route("/join", post(join))
        .route("/role", post(set_role))
        .route("/broadcast", post(broadcast))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub room_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub room_name: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RoleBody {
    pub role: ParticipantRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub room_name: String,
    pub delivered: usize,
    pub track_uri: Option<String>,
}

async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<JoinRequest>,
) -> ApiResult<Json<JoinResponse>> {
    let room_name = join_room(&state.sessions, &state.rooms, &auth.session, &body.room_name)?;
    Ok(Json(JoinResponse { room_name }))
}

/// Record the caller's declared role
///
/// The role is taken at the caller's word.
async fn set_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<RoleBody>,
) -> ApiResult<Json<RoleBody>> {
    if !state.sessions.set_role(auth.session.id, body.role) {
        return Err(ApiError::Unauthorized);
    }
    tracing::info!(session_id = %auth.session.id, role = %body.role, "Role declared");
    Ok(Json(body))
}

/// Capture the host's playback now and fan it out to its room
async fn broadcast(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<BroadcastResponse>> {
    let session = &auth.session;
    if !session.role.is_host() {
        return Err(ApiError::Forbidden("only the host can broadcast".to_string()));
    }
    let room = session.room.clone().ok_or(ApiError::NotInRoom)?;

    let Some(snapshot) = state.playback.capture(session.access_token()).await? else {
        return Ok(Json(BroadcastResponse {
            room_name: room,
            delivered: 0,
            track_uri: None,
        }));
    };

    let track_uri = snapshot.track_uri.clone();
    let delivered = state
        .broadcaster
        .on_host_snapshot_ready(&room, session.access_token(), snapshot, session.connection_id)
        .await;

    Ok(Json(BroadcastResponse {
        room_name: room,
        delivered,
        track_uri: Some(track_uri),
    }))
}
