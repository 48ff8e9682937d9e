//! Real-time channel for listening rooms
//!
//! This module handles:
//! - Socket authentication and lifecycle
//! - Room membership and fan-out
//! - Host snapshot broadcast and follower drift correction
//! - Shared queue relay through the host

pub mod broadcaster;
pub mod connection;
pub mod handler;
pub mod messages;
pub mod poller;
pub mod rooms;
pub mod sync;

pub use broadcaster::Broadcaster;
pub use handler::ws_handler;
pub use messages::{ClientMessage, ServerMessage};
pub use rooms::{ConnectionId, RoomRegistry};
pub use sync::{SyncError, SyncHandler};
