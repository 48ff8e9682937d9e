//! Spotify API request and response models

use serde::{Deserialize, Serialize};

/// Tokens granted by the accounts service
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Absent on refresh responses that keep the previous refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// A playable track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl Track {
    /// Artist names joined for display
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Artist reference embedded in a track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtistRef {
    pub name: String,
}

/// Player state returned by `GET /me/player`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentPlayback {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub item: Option<Track>,
}

/// Current user profile
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Body for `PUT /me/player/play`
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ms: Option<u64>,
}

impl PlayRequest {
    /// Start a specific track at an offset
    pub fn track_at(uri: impl Into<String>, position_ms: u64) -> Self {
        Self {
            uris: Some(vec![uri.into()]),
            position_ms: Some(position_ms),
        }
    }
}

// Internal response types for deserialization

#[derive(Debug, Deserialize)]
pub(crate) struct QueueResponse {
    #[serde(default)]
    pub queue: Vec<Track>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackPage {
    #[serde(default)]
    pub items: Vec<Track>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub status: u16,
    pub message: String,
}
