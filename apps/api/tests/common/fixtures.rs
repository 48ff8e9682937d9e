//! In-process provider fake
//!
//! Each access token gets its own scripted player so host and follower
//! sessions can be driven independently in one test.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use chrono::Utc;
use tandem_api::models::{PlaybackSnapshot, ProviderTokens, QueueEntry};
use tandem_api::services::PlaybackProvider;
use tandem_spotify_client::{SpotifyError, SpotifyResult};

/// A provider call as the fake saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Play {
        token: String,
        track_uri: Option<String>,
        position_ms: Option<u64>,
    },
    Pause { token: String },
    Next { token: String },
    Previous { token: String },
    Enqueue { token: String, track_uri: String },
}

#[derive(Default)]
struct Inner {
    players: HashMap<String, PlaybackSnapshot>,
    queue: Vec<QueueEntry>,
    catalog: HashMap<String, String>,
    users: HashMap<String, String>,
    calls: Vec<ProviderCall>,
    failing: bool,
    hanging: bool,
}

/// Scriptable [`PlaybackProvider`]
#[derive(Default)]
pub struct MockProvider {
    inner: Mutex<Inner>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every provider call fail with a 500
    pub fn fail_all(&self) {
        self.inner.lock().unwrap().failing = true;
    }

    /// Make player reads never resolve
    pub fn hang_reads(&self) {
        self.inner.lock().unwrap().hanging = true;
    }

    async fn stall_if_hanging(&self) {
        let hanging = self.inner.lock().unwrap().hanging;
        if hanging {
            std::future::pending::<()>().await;
        }
    }

    /// Put `token`'s player on `track_uri` at `position_ms`
    pub fn set_playing(&self, token: &str, track_uri: &str, position_ms: u64, is_playing: bool) {
        let snapshot = snapshot(track_uri, position_ms, is_playing, Utc::now().timestamp_millis());
        self.inner
            .lock()
            .unwrap()
            .players
            .insert(token.to_string(), snapshot);
    }

    pub fn set_queue(&self, entries: &[(&str, &str)]) {
        self.inner.lock().unwrap().queue = entries
            .iter()
            .map(|(uri, name)| QueueEntry {
                track_uri: uri.to_string(),
                track_name: name.to_string(),
            })
            .collect();
    }

    /// Make `query` resolve to `track_uri`
    pub fn add_track(&self, query: &str, track_uri: &str) {
        self.inner
            .lock()
            .unwrap()
            .catalog
            .insert(query.to_string(), track_uri.to_string());
    }

    pub fn add_user(&self, token: &str, display_name: &str) {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(token.to_string(), display_name.to_string());
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, token: &str) -> Vec<ProviderCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                ProviderCall::Play { token: t, .. }
                | ProviderCall::Pause { token: t }
                | ProviderCall::Next { token: t }
                | ProviderCall::Previous { token: t }
                | ProviderCall::Enqueue { token: t, .. } => t == token,
            })
            .collect()
    }

    fn check(&self) -> SpotifyResult<()> {
        if self.inner.lock().unwrap().failing {
            return Err(SpotifyError::Api {
                status: 500,
                message: "provider unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, call: ProviderCall) -> SpotifyResult<()> {
        self.check()?;
        self.inner.lock().unwrap().calls.push(call);
        Ok(())
    }
}

/// Snapshot fixture with a derived track name
pub fn snapshot(track_uri: &str, position_ms: u64, is_playing: bool, captured_at_ms: i64) -> PlaybackSnapshot {
    PlaybackSnapshot {
        track_uri: track_uri.to_string(),
        track_name: format!("Track {}", track_uri.rsplit(':').next().unwrap_or(track_uri)),
        artist_names: "Test Artist".to_string(),
        position_ms,
        is_playing,
        captured_at_ms,
    }
}

#[async_trait]
impl PlaybackProvider for MockProvider {
    fn authorize_url(&self, state: &str) -> SpotifyResult<String> {
        Ok(format!("https://accounts.example/authorize?state={}", state))
    }

    async fn authenticate(&self, code: &str) -> SpotifyResult<ProviderTokens> {
        self.check()?;
        Ok(ProviderTokens {
            access_token: format!("access-{}", code),
            refresh_token: Some(format!("refresh-{}", code)),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> SpotifyResult<ProviderTokens> {
        self.check()?;
        Ok(ProviderTokens {
            access_token: format!("{}-renewed", refresh_token),
            refresh_token: None,
        })
    }

    async fn play(
        &self,
        access_token: &str,
        track_uri: Option<&str>,
        position_ms: Option<u64>,
    ) -> SpotifyResult<()> {
        self.record(ProviderCall::Play {
            token: access_token.to_string(),
            track_uri: track_uri.map(str::to_string),
            position_ms,
        })?;

        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now().timestamp_millis();
        match track_uri {
            Some(uri) => {
                inner.players.insert(
                    access_token.to_string(),
                    snapshot(uri, position_ms.unwrap_or(0), true, now),
                );
            }
            None => {
                if let Some(player) = inner.players.get_mut(access_token) {
                    player.is_playing = true;
                }
            }
        }
        Ok(())
    }

    async fn pause(&self, access_token: &str) -> SpotifyResult<()> {
        self.record(ProviderCall::Pause {
            token: access_token.to_string(),
        })?;
        if let Some(player) = self.inner.lock().unwrap().players.get_mut(access_token) {
            player.is_playing = false;
        }
        Ok(())
    }

    async fn next(&self, access_token: &str) -> SpotifyResult<()> {
        self.record(ProviderCall::Next {
            token: access_token.to_string(),
        })
    }

    async fn previous(&self, access_token: &str) -> SpotifyResult<()> {
        self.record(ProviderCall::Previous {
            token: access_token.to_string(),
        })
    }

    async fn current_playback(&self, access_token: &str) -> SpotifyResult<Option<PlaybackSnapshot>> {
        self.stall_if_hanging().await;
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.players.get(access_token).cloned())
    }

    async fn current_queue(&self, _access_token: &str) -> SpotifyResult<Vec<QueueEntry>> {
        self.stall_if_hanging().await;
        self.check()?;
        Ok(self.inner.lock().unwrap().queue.clone())
    }

    async fn search_track(&self, _access_token: &str, query: &str) -> SpotifyResult<Option<String>> {
        self.check()?;
        Ok(self.inner.lock().unwrap().catalog.get(query).cloned())
    }

    async fn enqueue(&self, access_token: &str, track_uri: &str) -> SpotifyResult<()> {
        self.record(ProviderCall::Enqueue {
            token: access_token.to_string(),
            track_uri: track_uri.to_string(),
        })
    }

    async fn current_user(&self, access_token: &str) -> SpotifyResult<String> {
        self.check()?;
        self.inner
            .lock()
            .unwrap()
            .users
            .get(access_token)
            .cloned()
            .ok_or(SpotifyError::Unauthorized)
    }
}
