//! Playback capture and correction against a session's own credentials

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tandem_spotify_client::SpotifyError;
use tokio::time::timeout;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::PlaybackSnapshot;
use crate::services::drift::{Correction, DriftCorrector};
use crate::services::provider::PlaybackProvider;
use crate::services::session::SessionStore;

/// Longest accepted search query
const MAX_QUERY_LENGTH: usize = 256;

#[derive(Clone)]
pub struct PlaybackService {
    provider: Arc<dyn PlaybackProvider>,
    sessions: SessionStore,
    corrector: DriftCorrector,
    provider_timeout: Duration,
}

impl PlaybackService {
    pub fn new(
        provider: Arc<dyn PlaybackProvider>,
        sessions: SessionStore,
        corrector: DriftCorrector,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            sessions,
            corrector,
            provider_timeout,
        }
    }

    pub fn provider(&self) -> &Arc<dyn PlaybackProvider> {
        &self.provider
    }

    /// Capture the player state behind `access_token`
    ///
    /// `Ok(None)` means nothing is playing. The provider call is bounded by
    /// the configured timeout.
    pub async fn capture(&self, access_token: &str) -> ApiResult<Option<PlaybackSnapshot>> {
        match timeout(self.provider_timeout, self.provider.current_playback(access_token)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ApiError::Provider(SpotifyError::Timeout)),
        }
    }

    /// Capture for background loops: any failure yields an empty snapshot
    pub async fn capture_or_empty(&self, access_token: &str) -> Option<PlaybackSnapshot> {
        match self.capture(access_token).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(error = %e, "Snapshot capture failed, treating as empty");
                None
            }
        }
    }

    /// Bring the session's player in line with `host`
    ///
    /// Hosts never correct against themselves, and a snapshot captured
    /// before the last one applied is ignored. Returns the correction that
    /// was carried out.
    pub async fn sync_to_host(&self, session_id: Uuid, host: &PlaybackSnapshot) -> ApiResult<Correction> {
        let session = self.sessions.get(session_id).ok_or(ApiError::Unauthorized)?;

        if session.role.is_host() {
            tracing::debug!(session_id = %session_id, "Host does not sync to itself");
            return Ok(Correction::None);
        }

        if !self.sessions.record_host_snapshot(session_id, host.captured_at_ms) {
            tracing::debug!(
                session_id = %session_id,
                captured_at_ms = host.captured_at_ms,
                "Ignoring stale host snapshot"
            );
            return Ok(Correction::None);
        }

        let local = self.capture(session.access_token()).await?;
        let now_ms = Utc::now().timestamp_millis();
        let correction = self.corrector.decide(local.as_ref(), Some(host), now_ms);

        self.execute(session.access_token(), &correction, host).await?;

        if correction != Correction::None {
            tracing::debug!(
                session_id = %session_id,
                correction = ?correction,
                "Applied drift correction"
            );
        }

        Ok(correction)
    }

    /// Carry out `correction` with the follower's credentials
    async fn execute(
        &self,
        access_token: &str,
        correction: &Correction,
        host: &PlaybackSnapshot,
    ) -> ApiResult<()> {
        match correction {
            Correction::None => {}
            Correction::PlaySeek {
                track_uri,
                position_ms,
            } => {
                self.provider
                    .play(access_token, Some(track_uri), Some(*position_ms))
                    .await?;
                // Seeking starts playback, so mirror a paused host afterwards
                if !host.is_playing {
                    self.provider.pause(access_token).await?;
                }
            }
            Correction::Pause => self.provider.pause(access_token).await?,
        }
        Ok(())
    }

    /// Resolve a free-text query to the first matching track URI
    pub async fn resolve_track(&self, access_token: &str, query: &str) -> ApiResult<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::ValidationError(
                "search query must not be empty".to_string(),
            ));
        }
        if query.len() > MAX_QUERY_LENGTH {
            return Err(ApiError::ValidationError(format!(
                "search query must be at most {} characters",
                MAX_QUERY_LENGTH
            )));
        }

        self.provider
            .search_track(access_token, query)
            .await?
            .ok_or_else(|| ApiError::SearchNoResult(query.to_string()))
    }
}
