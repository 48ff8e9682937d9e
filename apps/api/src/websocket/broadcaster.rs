//! Fan-out of host playback and relayed queue requests

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::messages::{AddToQueuePayload, MasterTrackPayload, ServerMessage};
use super::rooms::{ConnectionId, RoomRegistry};
use crate::models::{PlaybackSnapshot, QueueEntry};
use crate::services::PlaybackProvider;

#[derive(Clone)]
pub struct Broadcaster {
    provider: Arc<dyn PlaybackProvider>,
    rooms: RoomRegistry,
    provider_timeout: Duration,
}

impl Broadcaster {
    pub fn new(provider: Arc<dyn PlaybackProvider>, rooms: RoomRegistry, provider_timeout: Duration) -> Self {
        Self {
            provider,
            rooms,
            provider_timeout,
        }
    }

    /// Send the host's snapshot and queue to the rest of `room`
    ///
    /// A failed or slow queue fetch is replaced with an empty queue so the
    /// snapshot still goes out. Returns the number of members reached.
    pub async fn on_host_snapshot_ready(
        &self,
        room: &str,
        host_access_token: &str,
        snapshot: PlaybackSnapshot,
        sender: Option<ConnectionId>,
    ) -> usize {
        let queue = self.fetch_queue(room, host_access_token).await;

        let message = ServerMessage::MasterTrackUpdated(MasterTrackPayload {
            current: snapshot,
            queue,
        });
        let delivered = self.rooms.broadcast(room, &message, sender);

        tracing::debug!(room = room, delivered, "Host snapshot broadcast");
        delivered
    }

    async fn fetch_queue(&self, room: &str, access_token: &str) -> Vec<QueueEntry> {
        match timeout(self.provider_timeout, self.provider.current_queue(access_token)).await {
            Ok(Ok(queue)) => queue,
            Ok(Err(e)) => {
                tracing::warn!(room = room, error = %e, "Queue fetch failed, broadcasting without queue");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(room = room, "Queue fetch timed out, broadcasting without queue");
                Vec::new()
            }
        }
    }

    /// Relay an enqueue request to every member of `room`
    ///
    /// Only the host's connection acts on it.
    pub fn request_enqueue(&self, room: &str, track_uri: &str) -> usize {
        let message = ServerMessage::AddToQueue(AddToQueuePayload {
            track_uri: track_uri.to_string(),
        });
        let delivered = self.rooms.broadcast(room, &message, None);

        tracing::debug!(room = room, track_uri = track_uri, delivered, "Enqueue request relayed");
        delivered
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }
}
