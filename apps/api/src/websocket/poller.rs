//! Per-socket background loops
//!
//! Two independent tasks share one `watch` value holding the session's
//! latest local snapshot:
//!
//! - refresh: captures the session's playback on a fixed interval and
//!   publishes it (empty when capture fails or times out)
//! - broadcast: on every published snapshot, fans it out to the room while
//!   the session is the host of a room
//!
//! Both stop once the session ends or binds a newer socket.
//!
//! Neither task ever surfaces an error; a bad cycle is logged and the next
//! tick is the retry.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::sync::SyncHandler;
use crate::models::PlaybackSnapshot;

pub type SnapshotSender = watch::Sender<Option<PlaybackSnapshot>>;
pub type SnapshotReceiver = watch::Receiver<Option<PlaybackSnapshot>>;

/// Handles for a socket's loops; both stop when this is dropped
pub struct SyncLoops {
    refresh: JoinHandle<()>,
    broadcast: JoinHandle<()>,
}

impl SyncLoops {
    pub fn spawn(handler: SyncHandler, poll_interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);

        let refresh = tokio::spawn(run_refresh(handler.clone(), tx, poll_interval));
        let broadcast = tokio::spawn(run_broadcast(handler, rx));

        Self { refresh, broadcast }
    }

    pub fn is_finished(&self) -> bool {
        self.refresh.is_finished() && self.broadcast.is_finished()
    }
}

impl Drop for SyncLoops {
    fn drop(&mut self) {
        self.refresh.abort();
        self.broadcast.abort();
    }
}

/// Capture the session's snapshot every `poll_interval`
pub async fn run_refresh(handler: SyncHandler, tx: SnapshotSender, poll_interval: Duration) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(session) = handler.sessions().get(handler.session_id()) else {
            tracing::debug!(session_id = %handler.session_id(), "Session ended, stopping refresh");
            break;
        };
        if session.connection_id != Some(handler.connection_id()) {
            tracing::debug!(
                connection_id = %handler.connection_id(),
                "Socket no longer bound to its session, stopping refresh"
            );
            break;
        }

        let snapshot = handler.playback().capture_or_empty(session.access_token()).await;
        if tx.send(snapshot).is_err() {
            break;
        }
    }
}

/// Broadcast each published snapshot while the session hosts a room
pub async fn run_broadcast(handler: SyncHandler, mut rx: SnapshotReceiver) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();

        let Some(session) = handler.sessions().get(handler.session_id()) else {
            break;
        };
        if session.connection_id != Some(handler.connection_id()) {
            break;
        }
        if !session.role.is_host() {
            continue;
        }
        let Some(room) = session.room.as_deref() else {
            continue;
        };
        let Some(snapshot) = snapshot else {
            tracing::debug!(room = room, "Host has nothing playing, skipping broadcast");
            continue;
        };

        handler
            .broadcaster()
            .on_host_snapshot_ready(
                room,
                session.access_token(),
                snapshot,
                Some(handler.connection_id()),
            )
            .await;
    }
}
