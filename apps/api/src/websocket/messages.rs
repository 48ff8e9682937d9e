//! WebSocket message types for listening-room sync
//!
//! Frames are JSON objects tagged `{"type": ..., "payload": ...}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ParticipantRole, PlaybackSnapshot, QueueEntry};

// =============================================================================
// Client -> Server Messages
// =============================================================================

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Move this connection into a room
    JoinRoom(JoinRoomPayload),

    /// Declare this session's role
    SetRole(SetRolePayload),

    /// Heartbeat to keep connection alive
    Heartbeat,
}

// =============================================================================
// Server -> Client Messages
// =============================================================================

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Connection established successfully
    Connected(ConnectedPayload),

    /// Join acknowledged
    RoomJoined(RoomJoinedPayload),

    /// Host playback and queue, fanned out to the room
    MasterTrackUpdated(MasterTrackPayload),

    /// Enqueue request relayed to the room; only the host acts on it
    AddToQueue(AddToQueuePayload),

    /// Heartbeat response
    Pong {
        #[serde(rename = "serverTime")]
        server_time: i64,
    },

    /// Error occurred
    Error(ErrorPayload),
}

// =============================================================================
// Payload Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRolePayload {
    pub role: ParticipantRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub connection_id: Uuid,
    pub room: Option<String>,
    pub role: ParticipantRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedPayload {
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterTrackPayload {
    pub current: PlaybackSnapshot,
    pub queue: Vec<QueueEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToQueuePayload {
    pub track_uri: String,
}

/// Payload for Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            code: code.into(),
            message: message.into(),
        })
    }
}
