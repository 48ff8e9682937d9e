//! Shared application state

use std::sync::Arc;

use tandem_spotify_client::SpotifyClient;

use crate::config::Config;
use crate::error::ApiResult;
use crate::services::{AuthService, DriftCorrector, PlaybackProvider, PlaybackService, SessionStore};
use crate::websocket::{Broadcaster, RoomRegistry};

/// Everything request handlers and sockets share for the process lifetime
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provider: Arc<dyn PlaybackProvider>,
    pub sessions: SessionStore,
    pub rooms: RoomRegistry,
    pub auth: AuthService,
    pub playback: PlaybackService,
    pub broadcaster: Broadcaster,
}

impl AppState {
    /// Wire the services around `provider`
    pub fn new(config: Config, provider: Arc<dyn PlaybackProvider>) -> Self {
        let sessions = SessionStore::with_ttl_secs(config.session_ttl_secs);
        let rooms = RoomRegistry::new();
        let sync = *config.sync();

        let auth = AuthService::new(
            provider.clone(),
            sessions.clone(),
            &config.session_secret,
            config.session_ttl_secs,
        );
        let playback = PlaybackService::new(
            provider.clone(),
            sessions.clone(),
            DriftCorrector::new(sync.drift_tolerance_ms),
            sync.provider_timeout(),
        );
        let broadcaster = Broadcaster::new(provider.clone(), rooms.clone(), sync.provider_timeout());

        Self {
            config: Arc::new(config),
            provider,
            sessions,
            rooms,
            auth,
            playback,
            broadcaster,
        }
    }

    /// Build state backed by the Spotify Web API
    pub fn with_spotify(config: Config) -> ApiResult<Self> {
        let spotify = config.spotify();
        let client = SpotifyClient::new(
            spotify.client_id.clone(),
            spotify.client_secret.clone(),
            spotify.redirect_uri.clone(),
        )?
        .with_base_urls(spotify.api_url.clone(), spotify.accounts_url.clone());

        Ok(Self::new(config, Arc::new(client)))
    }
}
