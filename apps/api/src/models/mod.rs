//! Data types for playback synchronization
//!
//! - Playback snapshots and queue entries
//! - Sessions, participant roles and session token claims

pub mod session;
pub mod snapshot;

pub use session::{Claims, ParticipantRole, ProviderTokens, Session};
pub use snapshot::{PlaybackSnapshot, QueueEntry};
