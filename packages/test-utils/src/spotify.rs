//! Mock Spotify server for testing the provider client
//!
//! Provides a [`MockSpotifyServer`] that simulates the Web API and accounts
//! endpoints the listening room depends on.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock Spotify server
///
/// Wraps a [`wiremock::MockServer`]. The Web API is served under `/v1`, the
/// accounts service at the root, matching `SpotifyClient::with_base_urls(
/// server.api_url(), server.accounts_url())`.
///
/// # Example
///
/// ```rust,ignore
/// use tandem_test_utils::{MockSpotifyServer, TrackFixture};
///
/// #[tokio::test]
/// async fn test_playback() {
///     let server = MockSpotifyServer::start().await;
///     server.mock_playback(&TrackFixture::new("abc", "Song"), 1_000, true).await;
/// }
/// ```
pub struct MockSpotifyServer {
    server: MockServer,
    access_token: String,
}

impl MockSpotifyServer {
    /// Start a new mock server expecting the default access token
    pub async fn start() -> Self {
        Self::start_with_token("test-access-token").await
    }

    /// Start a new mock server expecting a custom access token
    pub async fn start_with_token(access_token: &str) -> Self {
        Self {
            server: MockServer::start().await,
            access_token: access_token.to_string(),
        }
    }

    /// Web API base URL
    pub fn api_url(&self) -> String {
        format!("{}/v1", self.server.uri())
    }

    /// Accounts service base URL
    pub fn accounts_url(&self) -> String {
        self.server.uri()
    }

    /// The access token the mocks accept
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Requests received so far
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Mount a successful authorization code exchange
    pub async fn mock_token_exchange(&self, access_token: &str, refresh_token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "scope": "user-read-playback-state",
                "expires_in": 3600,
                "refresh_token": refresh_token,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a successful refresh token exchange
    pub async fn mock_token_refresh(&self, access_token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a rejected token exchange
    pub async fn mock_token_rejected(&self) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code",
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a player state with a track
    pub async fn mock_playback(&self, track: &TrackFixture, progress_ms: u64, is_playing: bool) {
        Mock::given(method("GET"))
            .and(path("/v1/me/player"))
            .and(header("Authorization", self.bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "is_playing": is_playing,
                "progress_ms": progress_ms,
                "timestamp": 1_700_000_000_000u64,
                "item": track.to_json(),
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount an idle player (204 No Content)
    pub async fn mock_no_playback(&self) {
        Mock::given(method("GET"))
            .and(path("/v1/me/player"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// Mount a queue listing
    pub async fn mock_queue(&self, tracks: &[TrackFixture]) {
        let queue: Vec<serde_json::Value> = tracks.iter().map(TrackFixture::to_json).collect();

        Mock::given(method("GET"))
            .and(path("/v1/me/player/queue"))
            .and(header("Authorization", self.bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "currently_playing": null,
                "queue": queue,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a search returning the given tracks
    pub async fn mock_search(&self, query: &str, tracks: &[TrackFixture]) {
        let items: Vec<serde_json::Value> = tracks.iter().map(TrackFixture::to_json).collect();

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("q", query))
            .and(query_param("type", "track"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tracks": { "items": items, "total": items.len() }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a successful no-content response for a player command
    ///
    /// `command` is one of `play`, `pause`, `next`, `previous`, `queue`.
    pub async fn mock_player_command(&self, command: &str) {
        let http_method = match command {
            "play" | "pause" => "PUT",
            _ => "POST",
        };

        Mock::given(method(http_method))
            .and(path(format!("/v1/me/player/{}", command)))
            .and(header("Authorization", self.bearer().as_str()))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// Mount the current user's profile
    pub async fn mock_current_user(&self, id: &str, display_name: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(header("Authorization", self.bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "display_name": display_name,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount an expired-token response for every Web API path
    pub async fn mock_expired_token(&self) {
        Mock::given(wiremock::matchers::path_regex("^/v1/.*"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "status": 401, "message": "The access token expired" }
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a player error, e.g. no active device
    pub async fn mock_player_error(&self, status: u16, message: &str) {
        Mock::given(wiremock::matchers::path_regex("^/v1/me/player.*"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": { "status": status, "message": message }
            })))
            .mount(&self.server)
            .await;
    }
}

/// Fixture for track objects
#[derive(Debug, Clone)]
pub struct TrackFixture {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub duration_ms: u64,
}

impl TrackFixture {
    /// Create a track with a single artist
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec!["Test Artist".to_string()],
            duration_ms: 240_000,
        }
    }

    /// Replace the artist list
    pub fn with_artists(mut self, artists: &[&str]) -> Self {
        self.artists = artists.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Track URI
    pub fn uri(&self) -> String {
        format!("spotify:track:{}", self.id)
    }

    /// Convert to the Web API JSON shape
    pub fn to_json(&self) -> serde_json::Value {
        let artists: Vec<serde_json::Value> = self
            .artists
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();

        json!({
            "id": self.id,
            "uri": self.uri(),
            "name": self.name,
            "artists": artists,
            "duration_ms": self.duration_ms,
            "type": "track",
        })
    }
}
