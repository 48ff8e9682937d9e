//! Streaming provider capability consumed by the sync server
//!
//! Everything above this layer talks to [`PlaybackProvider`] rather than the
//! concrete Spotify client, so route and sync tests can swap in an in-process
//! fake.

use axum::async_trait;
use chrono::Utc;
use tandem_spotify_client::{PlayRequest, SpotifyClient, SpotifyResult, PLAYER_SCOPES};

use crate::models::{PlaybackSnapshot, ProviderTokens, QueueEntry};

/// Player capabilities one listener's credentials unlock
#[async_trait]
pub trait PlaybackProvider: Send + Sync {
    /// Provider URL the browser is sent to for consent
    fn authorize_url(&self, state: &str) -> SpotifyResult<String>;

    /// Exchange an authorization code for tokens
    async fn authenticate(&self, code: &str) -> SpotifyResult<ProviderTokens>;

    /// Obtain a fresh access token
    async fn refresh(&self, refresh_token: &str) -> SpotifyResult<ProviderTokens>;

    /// Resume playback, or start `track_uri` at `position_ms` when given
    async fn play(
        &self,
        access_token: &str,
        track_uri: Option<&str>,
        position_ms: Option<u64>,
    ) -> SpotifyResult<()>;

    async fn pause(&self, access_token: &str) -> SpotifyResult<()>;

    async fn next(&self, access_token: &str) -> SpotifyResult<()>;

    async fn previous(&self, access_token: &str) -> SpotifyResult<()>;

    /// Current playback, `None` when nothing is loaded
    async fn current_playback(&self, access_token: &str) -> SpotifyResult<Option<PlaybackSnapshot>>;

    async fn current_queue(&self, access_token: &str) -> SpotifyResult<Vec<QueueEntry>>;

    /// URI of the best match for `query`, `None` when nothing matches
    async fn search_track(&self, access_token: &str, query: &str) -> SpotifyResult<Option<String>>;

    async fn enqueue(&self, access_token: &str, track_uri: &str) -> SpotifyResult<()>;

    /// Display name of the credential owner
    async fn current_user(&self, access_token: &str) -> SpotifyResult<String>;
}

#[async_trait]
impl PlaybackProvider for SpotifyClient {
    fn authorize_url(&self, state: &str) -> SpotifyResult<String> {
        SpotifyClient::authorize_url(self, PLAYER_SCOPES, state)
    }

    async fn authenticate(&self, code: &str) -> SpotifyResult<ProviderTokens> {
        let grant = self.exchange_code(code).await?;
        Ok(ProviderTokens {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> SpotifyResult<ProviderTokens> {
        let grant = self.refresh_access_token(refresh_token).await?;
        Ok(ProviderTokens {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
        })
    }

    async fn play(
        &self,
        access_token: &str,
        track_uri: Option<&str>,
        position_ms: Option<u64>,
    ) -> SpotifyResult<()> {
        let request = track_uri.map(|uri| PlayRequest {
            uris: Some(vec![uri.to_string()]),
            position_ms,
        });
        SpotifyClient::play(self, access_token, request).await
    }

    async fn pause(&self, access_token: &str) -> SpotifyResult<()> {
        SpotifyClient::pause(self, access_token).await
    }

    async fn next(&self, access_token: &str) -> SpotifyResult<()> {
        self.skip_next(access_token).await
    }

    async fn previous(&self, access_token: &str) -> SpotifyResult<()> {
        self.skip_previous(access_token).await
    }

    async fn current_playback(&self, access_token: &str) -> SpotifyResult<Option<PlaybackSnapshot>> {
        let playback = SpotifyClient::current_playback(self, access_token).await?;
        // Stamp as soon as the response lands so position and time stay paired
        let captured_at_ms = Utc::now().timestamp_millis();
        Ok(playback.and_then(|p| PlaybackSnapshot::from_playback(p, captured_at_ms)))
    }

    async fn current_queue(&self, access_token: &str) -> SpotifyResult<Vec<QueueEntry>> {
        let queue = SpotifyClient::current_queue(self, access_token).await?;
        Ok(queue.into_iter().map(QueueEntry::from).collect())
    }

    async fn search_track(&self, access_token: &str, query: &str) -> SpotifyResult<Option<String>> {
        let track = SpotifyClient::search_track(self, access_token, query).await?;
        Ok(track.map(|t| t.uri))
    }

    async fn enqueue(&self, access_token: &str, track_uri: &str) -> SpotifyResult<()> {
        self.add_to_queue(access_token, track_uri).await
    }

    async fn current_user(&self, access_token: &str) -> SpotifyResult<String> {
        let profile = SpotifyClient::current_user(self, access_token).await?;
        Ok(profile.display_name.unwrap_or(profile.id))
    }
}
