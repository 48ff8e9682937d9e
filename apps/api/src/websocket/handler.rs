//! WebSocket upgrade handler with session token authentication
//!
//! Clients pass their session token as the `token` query parameter. Each
//! accepted socket is bound to its session (replacing any earlier socket of
//! the same session), registered with the room registry and given its own
//! refresh and broadcast loops.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::{ClientMessage, ConnectedPayload, ServerMessage};
use super::poller::SyncLoops;
use super::sync::{SyncError, SyncHandler};
use crate::state::AppState;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQueryParams {
    /// Session token
    token: String,
}

/// WebSocket upgrade handler
///
/// Authenticates the connection via the session token in the query string,
/// then upgrades to WebSocket and manages the connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQueryParams>,
    State(state): State<AppState>,
) -> Response {
    let session = match state.auth.verify_token(&params.token) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket auth failed");
            return ws.on_upgrade(|mut socket| async move {
                let error_msg = ServerMessage::error(e.error_code(), e.to_string());
                if let Ok(json) = serde_json::to_string(&error_msg) {
                    let _ = socket.send(Message::Text(json)).await;
                }
                let _ = socket.close().await;
            });
        }
    };

    let session_id = session.id;
    tracing::info!(session_id = %session_id, "WebSocket connection authenticated");

    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, session_id: Uuid, state: AppState) {
    // Room and role may have changed while the upgrade completed
    let Some(session) = state.sessions.get(session_id) else {
        tracing::debug!(session_id = %session_id, "Session ended before upgrade finished");
        return;
    };
    let connection_id = Uuid::new_v4();

    // Create unbounded channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.rooms.register(connection_id, session_id, tx);

    // A newer socket takes over the session's room membership
    if let Some(previous) = state.sessions.bind_connection(session_id, connection_id) {
        if let Some(room) = state.rooms.leave(previous) {
            tracing::debug!(
                session_id = %session_id,
                previous_connection = %previous,
                room = %room,
                "Replaced earlier socket"
            );
        }
    }
    if let Some(room) = session.room.as_deref() {
        state.rooms.join(connection_id, room);
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let sync_handler = SyncHandler::new(
        session_id,
        connection_id,
        state.sessions.clone(),
        state.playback.clone(),
        state.broadcaster.clone(),
        state.config.sync().provider_timeout(),
    );

    let connected_msg = ServerMessage::Connected(ConnectedPayload {
        connection_id,
        room: session.room.clone(),
        role: session.role,
    });

    if let Ok(json) = serde_json::to_string(&connected_msg) {
        if ws_sender.send(Message::Text(json)).await.is_err() {
            tracing::warn!(session_id = %session_id, "Failed to send connected message");
            cleanup(&state, session_id, connection_id);
            return;
        }
    }

    let loops = SyncLoops::spawn(sync_handler.clone(), state.config.sync().poll_interval());

    // Forward outbound messages, reacting to room events on the way
    let event_handler = sync_handler.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if matches!(
                msg,
                ServerMessage::MasterTrackUpdated(_) | ServerMessage::AddToQueue(_)
            ) {
                let handler = event_handler.clone();
                let event = msg.clone();
                tokio::spawn(async move {
                    if let Err(e) = handler.on_room_event(&event).await {
                        tracing::warn!(
                            error = %e,
                            session_id = %handler.session_id(),
                            "Failed to act on room event"
                        );
                    }
                });
            }

            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        tracing::debug!(connection_id = %connection_id, "WebSocket send failed");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
    });

    // Handle incoming messages
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let outcome = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(msg) => sync_handler.handle_message(msg).await,
                        Err(e) => Err(SyncError::from(e)),
                    };

                    match outcome {
                        Ok(()) => {}
                        Err(SyncError::SessionEnded) => {
                            sync_handler.send_error(&SyncError::SessionEnded);
                            break;
                        }
                        Err(e) => {
                            tracing::debug!(
                                error = %e,
                                connection_id = %connection_id,
                                "Error handling client message"
                            );
                            sync_handler.send_error(&e);
                        }
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(connection_id = %connection_id, "Received unsupported binary message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    tracing::trace!(connection_id = %connection_id, "Received ping/pong");
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "WebSocket close received");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, connection_id = %connection_id, "WebSocket error");
                    break;
                }
            }
        }
    });

    // Wait for either task to complete, then abort the other
    tokio::select! {
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task completed");
            send_task.abort();
        }
    }

    drop(loops);
    cleanup(&state, session_id, connection_id);

    tracing::info!(
        session_id = %session_id,
        connection_id = %connection_id,
        "WebSocket connection closed"
    );
}

fn cleanup(state: &AppState, session_id: Uuid, connection_id: Uuid) {
    state.rooms.unregister(connection_id);
    state.sessions.unbind_connection(session_id, connection_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_query_params_deserialization() {
        let params: WsQueryParams =
            serde_json::from_str(r#"{"token": "abc.def.ghi"}"#).unwrap();
        assert_eq!(params.token, "abc.def.ghi");
    }

    #[test]
    fn test_ws_query_params_require_token() {
        assert!(serde_json::from_str::<WsQueryParams>("{}").is_err());
    }
}
