//! Room registry
//!
//! Tracks which live connection sits in which room. Membership changes go
//! through [`RoomRegistry::join`] and [`RoomRegistry::leave`], which hold one
//! lock for their whole update so a connection is never seen in two rooms.
//! Broadcasts deliver while holding the same lock, so a broadcast reaches
//! exactly the members present at call time.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::connection::ConnectionHandle;
use super::messages::ServerMessage;

pub type ConnectionId = Uuid;

#[derive(Debug, Default)]
struct Membership {
    /// room -> member connections
    rooms: HashMap<String, HashSet<ConnectionId>>,
    /// connection -> its room
    room_of: HashMap<ConnectionId, String>,
}

impl Membership {
    fn remove(&mut self, connection_id: ConnectionId) -> Option<String> {
        let room = self.room_of.remove(&connection_id)?;
        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }
        Some(room)
    }
}

/// Process-wide registry of connections and the rooms they occupy
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    connections: Arc<DashMap<ConnectionId, ConnectionHandle>>,
    membership: Arc<Mutex<Membership>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn membership(&self) -> MutexGuard<'_, Membership> {
        self.membership.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a socket's outbound channel
    pub fn register(
        &self,
        connection_id: ConnectionId,
        session_id: Uuid,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.connections
            .insert(connection_id, ConnectionHandle::new(sender, session_id));
        tracing::debug!(
            connection_id = %connection_id,
            session_id = %session_id,
            connection_count = self.connections.len(),
            "Connection registered"
        );
    }

    /// Forget a connection entirely, leaving its room
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<String> {
        let room = self.leave(connection_id);
        self.connections.remove(&connection_id);
        tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        room
    }

    pub fn is_registered(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    /// Move `connection_id` into `room`, leaving whatever room it was in
    ///
    /// Joining the room it already occupies changes nothing. Returns the room
    /// it left, if any.
    pub fn join(&self, connection_id: ConnectionId, room: &str) -> Option<String> {
        let mut membership = self.membership();

        if membership.room_of.get(&connection_id).map(String::as_str) == Some(room) {
            return None;
        }

        let previous = membership.remove(connection_id);
        membership
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection_id);
        membership.room_of.insert(connection_id, room.to_string());
        drop(membership);

        tracing::debug!(
            connection_id = %connection_id,
            room = room,
            previous_room = previous.as_deref(),
            "Joined room"
        );
        previous
    }

    /// Take `connection_id` out of its room, reclaiming the room if it empties
    pub fn leave(&self, connection_id: ConnectionId) -> Option<String> {
        let room = self.membership().remove(connection_id);
        if let Some(room) = &room {
            tracing::debug!(connection_id = %connection_id, room = %room, "Left room");
        }
        room
    }

    pub fn room_of(&self, connection_id: ConnectionId) -> Option<String> {
        self.membership().room_of.get(&connection_id).cloned()
    }

    /// Current members of `room`
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.membership()
            .rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.membership().rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Deliver `message` to every member of `room` except `exclude`
    ///
    /// An unknown or empty room delivers nothing. Returns the number of
    /// members the message was handed to.
    pub fn broadcast(&self, room: &str, message: &ServerMessage, exclude: Option<ConnectionId>) -> usize {
        let membership = self.membership();
        let Some(members) = membership.rooms.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for connection_id in members {
            if Some(*connection_id) == exclude {
                continue;
            }
            if self.send_to(*connection_id, message.clone()) {
                delivered += 1;
            }
        }

        delivered
    }

    /// Send to one connection, `false` if it is gone
    pub fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) -> bool {
        match self.connections.get(&connection_id) {
            Some(handle) => match handle.send(message) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        session_id = %handle.session_id,
                        "Connection channel closed, message dropped"
                    );
                    false
                }
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::messages::AddToQueuePayload;

    fn connect(registry: &RoomRegistry) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        registry.register(id, Uuid::new_v4(), tx);
        (id, rx)
    }

    fn message(n: usize) -> ServerMessage {
        ServerMessage::AddToQueue(AddToQueuePayload {
            track_uri: format!("spotify:track:{}", n),
        })
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<String> {
        let mut uris = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let ServerMessage::AddToQueue(p) = msg {
                uris.push(p.track_uri);
            }
        }
        uris
    }

    #[test]
    fn test_join_is_exclusive() {
        let registry = RoomRegistry::new();
        let (c, _rx) = connect(&registry);

        assert_eq!(registry.join(c, "A"), None);
        assert_eq!(registry.join(c, "B"), Some("A".to_string()));

        assert!(registry.members("A").is_empty());
        assert_eq!(registry.members("B"), vec![c]);
        assert_eq!(registry.room_of(c).as_deref(), Some("B"));
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_join_twice_keeps_single_membership() {
        let registry = RoomRegistry::new();
        let (c, _rx) = connect(&registry);

        registry.join(c, "A");
        registry.join(c, "A");

        assert_eq!(registry.members("A"), vec![c]);
    }

    #[test]
    fn test_broadcast_reaches_current_members_only() {
        let registry = RoomRegistry::new();
        let (a, mut rx_a) = connect(&registry);
        let (b, mut rx_b) = connect(&registry);
        let (late, mut rx_late) = connect(&registry);
        let (other, mut rx_other) = connect(&registry);

        registry.join(a, "A");
        registry.join(b, "A");
        registry.join(other, "B");

        assert_eq!(registry.broadcast("A", &message(1), None), 2);

        registry.leave(b);
        registry.join(late, "A");
        assert_eq!(registry.broadcast("A", &message(2), None), 2);

        assert_eq!(drain(&mut rx_a), vec!["spotify:track:1", "spotify:track:2"]);
        assert_eq!(drain(&mut rx_b), vec!["spotify:track:1"]);
        assert_eq!(drain(&mut rx_late), vec!["spotify:track:2"]);
        assert!(drain(&mut rx_other).is_empty());
    }

    #[test]
    fn test_broadcast_can_skip_sender() {
        let registry = RoomRegistry::new();
        let (host, mut rx_host) = connect(&registry);
        let (follower, mut rx_follower) = connect(&registry);
        registry.join(host, "A");
        registry.join(follower, "A");

        assert_eq!(registry.broadcast("A", &message(1), Some(host)), 1);

        assert!(drain(&mut rx_host).is_empty());
        assert_eq!(drain(&mut rx_follower).len(), 1);
    }

    #[test]
    fn test_empty_room_broadcast_is_noop() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.broadcast("nobody", &message(1), None), 0);
    }

    #[test]
    fn test_broadcast_preserves_order_per_member() {
        let registry = RoomRegistry::new();
        let (c, mut rx) = connect(&registry);
        registry.join(c, "A");

        for n in 0..20 {
            registry.broadcast("A", &message(n), None);
        }

        let expected: Vec<String> = (0..20).map(|n| format!("spotify:track:{}", n)).collect();
        assert_eq!(drain(&mut rx), expected);
    }

    #[test]
    fn test_unregister_reclaims_room() {
        let registry = RoomRegistry::new();
        let (c, _rx) = connect(&registry);
        registry.join(c, "A");

        assert_eq!(registry.unregister(c), Some("A".to_string()));
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.connection_count(), 0);
        assert!(!registry.is_registered(c));
    }

    #[test]
    fn test_concurrent_joins_never_double_book() {
        let registry = RoomRegistry::new();
        let (c, _rx) = connect(&registry);

        std::thread::scope(|scope| {
            for room in ["A", "B", "C", "D"] {
                let registry = registry.clone();
                scope.spawn(move || {
                    for _ in 0..200 {
                        registry.join(c, room);
                    }
                });
            }
        });

        let total: usize = ["A", "B", "C", "D"]
            .iter()
            .map(|room| registry.members(room).len())
            .sum();
        assert_eq!(total, 1);
    }
}
