//! Point-in-time playback captures and queue entries

use serde::{Deserialize, Serialize};
use tandem_spotify_client::{CurrentPlayback, Track};

/// One player's state at the instant it was read from the provider
///
/// `position_ms` and `captured_at_ms` always come from the same provider
/// response, so [`PlaybackSnapshot::projected_position_ms`] can extrapolate
/// from them. Snapshots are never mutated after capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    /// Provider URI of the playing item
    pub track_uri: String,

    /// Display name of the track
    #[serde(default)]
    pub track_name: String,

    /// Artist names joined with ", "
    #[serde(default)]
    pub artist_names: String,

    /// Elapsed playback offset when captured
    pub position_ms: u64,

    /// Whether the player was playing when captured
    pub is_playing: bool,

    /// Capture-side Unix timestamp (ms) at which `position_ms` was read
    pub captured_at_ms: i64,
}

impl PlaybackSnapshot {
    /// Build a snapshot from a provider response read at `captured_at_ms`
    ///
    /// Returns `None` when nothing is loaded in the player.
    pub fn from_playback(playback: CurrentPlayback, captured_at_ms: i64) -> Option<Self> {
        let track = playback.item?;
        if track.uri.is_empty() {
            return None;
        }

        Some(Self {
            artist_names: track.artist_names(),
            track_uri: track.uri,
            track_name: track.name,
            position_ms: playback.progress_ms.unwrap_or(0),
            is_playing: playback.is_playing,
            captured_at_ms,
        })
    }

    /// Where this player should be at `now_ms`
    ///
    /// Playing snapshots advance by the time elapsed since capture; paused
    /// snapshots stay where they were. A `now_ms` earlier than the capture
    /// (clock skew) adds nothing.
    pub fn projected_position_ms(&self, now_ms: i64) -> u64 {
        if !self.is_playing {
            return self.position_ms;
        }

        let elapsed = now_ms.saturating_sub(self.captured_at_ms).max(0) as u64;
        self.position_ms.saturating_add(elapsed)
    }

    /// Progress formatted as `m:ss`
    pub fn progress_display(&self) -> String {
        let total_seconds = self.position_ms / 1000;
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

/// A track waiting in the host's queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub track_uri: String,
    pub track_name: String,
}

impl From<Track> for QueueEntry {
    fn from(track: Track) -> Self {
        Self {
            track_uri: track.uri,
            track_name: track.name,
        }
    }
}
