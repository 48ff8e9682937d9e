//! Per-connection sync logic
//!
//! [`SyncHandler`] handles frames a client sends and reacts to room events
//! before they are forwarded to the client: followers correct against host
//! snapshots, and the host carries out relayed enqueue requests.

use std::time::Duration;

use tandem_spotify_client::SpotifyError;
use thiserror::Error;
use tokio::time::timeout;
use uuid::Uuid;

use super::broadcaster::Broadcaster;
use super::messages::{
    ClientMessage, JoinRoomPayload, RoomJoinedPayload, ServerMessage, SetRolePayload,
};
use super::rooms::{ConnectionId, RoomRegistry};
use crate::error::ApiError;
use crate::models::{ParticipantRole, PlaybackSnapshot, Session};
use crate::services::{PlaybackService, SessionStore};

/// Longest accepted room name
pub const MAX_ROOM_NAME_LENGTH: usize = 64;

/// Trim and check a room name
pub fn validate_room_name(room_name: &str) -> Result<&str, &'static str> {
    let room_name = room_name.trim();
    if room_name.is_empty() {
        return Err("room name cannot be empty");
    }
    if room_name.len() > MAX_ROOM_NAME_LENGTH {
        return Err("room name too long (max 64 characters)");
    }
    if room_name.chars().any(char::is_control) {
        return Err("room name contains control characters");
    }
    Ok(room_name)
}

/// Put a session, and its bound socket if any, into `room_name`
///
/// Shared by the `join-room` frame and the HTTP join route.
pub fn join_room(
    sessions: &SessionStore,
    rooms: &RoomRegistry,
    session: &Session,
    room_name: &str,
) -> Result<String, ApiError> {
    let room = validate_room_name(room_name)
        .map_err(|e| ApiError::ValidationError(e.to_string()))?
        .to_string();

    sessions
        .set_room(session.id, room.clone())
        .ok_or(ApiError::Unauthorized)?;

    if let Some(connection_id) = session.connection_id {
        rooms.join(connection_id, &room);
        rooms.send_to(
            connection_id,
            ServerMessage::RoomJoined(RoomJoinedPayload {
                room_name: room.clone(),
            }),
        );
    }

    tracing::info!(session_id = %session.id, room = %room, "Session joined room");
    Ok(room)
}

/// Handles sync traffic for a single socket
#[derive(Clone)]
pub struct SyncHandler {
    session_id: Uuid,
    connection_id: ConnectionId,
    sessions: SessionStore,
    rooms: RoomRegistry,
    playback: PlaybackService,
    broadcaster: Broadcaster,
    provider_timeout: Duration,
}

impl SyncHandler {
    pub fn new(
        session_id: Uuid,
        connection_id: ConnectionId,
        sessions: SessionStore,
        playback: PlaybackService,
        broadcaster: Broadcaster,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            session_id,
            connection_id,
            sessions,
            rooms: broadcaster.rooms().clone(),
            playback,
            broadcaster,
            provider_timeout,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn playback(&self) -> &PlaybackService {
        &self.playback
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    fn session(&self) -> Result<Session, SyncError> {
        self.sessions.get(self.session_id).ok_or(SyncError::SessionEnded)
    }

    /// Handle an incoming client message
    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), SyncError> {
        match message {
            ClientMessage::JoinRoom(payload) => self.handle_join_room(payload),
            ClientMessage::SetRole(payload) => self.handle_set_role(payload),
            ClientMessage::Heartbeat => {
                self.send(ServerMessage::Pong {
                    server_time: chrono::Utc::now().timestamp_millis(),
                });
                Ok(())
            }
        }
    }

    /// The session, provided this socket still holds its binding
    ///
    /// A replaced socket is treated as ended so it cannot steer the session.
    fn bound_session(&self) -> Result<Session, SyncError> {
        let session = self.session()?;
        if session.connection_id != Some(self.connection_id) {
            tracing::debug!(
                session_id = %self.session_id,
                connection_id = %self.connection_id,
                "Frame from replaced socket rejected"
            );
            return Err(SyncError::SessionEnded);
        }
        Ok(session)
    }

    fn handle_join_room(&self, payload: JoinRoomPayload) -> Result<(), SyncError> {
        let session = self.bound_session()?;

        join_room(&self.sessions, &self.rooms, &session, &payload.room_name).map_err(|e| match e {
            ApiError::ValidationError(reason) => SyncError::InvalidRoom(reason),
            ApiError::Unauthorized => SyncError::SessionEnded,
            other => SyncError::Api(other),
        })?;
        Ok(())
    }

    fn handle_set_role(&self, payload: SetRolePayload) -> Result<(), SyncError> {
        self.bound_session()?;
        if !self.sessions.set_role(self.session_id, payload.role) {
            return Err(SyncError::SessionEnded);
        }
        tracing::info!(
            session_id = %self.session_id,
            role = %payload.role,
            "Role declared"
        );
        Ok(())
    }

    /// React to a room event addressed to this socket
    ///
    /// Called for every outbound message before it is written to the client.
    pub async fn on_room_event(&self, message: &ServerMessage) -> Result<(), SyncError> {
        match message {
            ServerMessage::MasterTrackUpdated(payload) => self.follow_host(&payload.current).await,
            ServerMessage::AddToQueue(payload) => self.enqueue_as_host(&payload.track_uri).await,
            _ => Ok(()),
        }
    }

    async fn follow_host(&self, host: &PlaybackSnapshot) -> Result<(), SyncError> {
        let session = self.session()?;
        if session.role != ParticipantRole::Client {
            return Ok(());
        }

        self.playback.sync_to_host(self.session_id, host).await?;
        Ok(())
    }

    async fn enqueue_as_host(&self, track_uri: &str) -> Result<(), SyncError> {
        let session = self.session()?;
        if !session.role.is_host() {
            return Ok(());
        }

        let enqueue = self
            .playback
            .provider()
            .enqueue(session.access_token(), track_uri);
        timeout(self.provider_timeout, enqueue)
            .await
            .map_err(|_| ApiError::Provider(SpotifyError::Timeout))?
            .map_err(ApiError::from)?;

        tracing::info!(
            session_id = %self.session_id,
            track_uri = track_uri,
            "Host enqueued relayed track"
        );
        Ok(())
    }

    /// Send a message to this connection
    pub fn send(&self, message: ServerMessage) {
        if !self.rooms.send_to(self.connection_id, message) {
            tracing::debug!(connection_id = %self.connection_id, "Connection gone, message dropped");
        }
    }

    /// Report a failed frame back to the client
    pub fn send_error(&self, error: &SyncError) {
        self.send(ServerMessage::error(error.code(), error.to_string()));
    }
}

/// Sync error types
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("session has ended")]
    SessionEnded,

    #[error("invalid room: {0}")]
    InvalidRoom(String),

    #[error("invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionEnded => "SESSION_ENDED",
            Self::InvalidRoom(_) => "INVALID_ROOM",
            Self::InvalidMessage(_) => "INVALID_MESSAGE",
            Self::Api(e) => e.error_code(),
        }
    }
}
