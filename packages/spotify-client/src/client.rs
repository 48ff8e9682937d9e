//! Spotify Web API client implementation

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{SpotifyError, SpotifyResult};
use crate::models::{
    CurrentPlayback, ErrorResponse, PlayRequest, QueueResponse, SearchResponse, TokenGrant, Track,
    UserProfile,
};

/// Spotify Web API base URL
pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Spotify accounts service base URL
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Scopes needed to read and control the user's player
pub const PLAYER_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "streaming",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-read-playback-state",
];

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Maximum search query length
const MAX_QUERY_LENGTH: usize = 256;

/// Spotify Web API client
///
/// Holds the OAuth client credentials; per-user calls take the user's
/// access token as an argument so one client serves every session.
#[derive(Clone)]
pub struct SpotifyClient {
    http_client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    api_url: String,
    accounts_url: String,
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl SpotifyClient {
    /// Create a new client against the public Spotify endpoints
    ///
    /// # Errors
    /// Returns `SpotifyError::MissingCredentials` if the client ID or secret is empty
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> SpotifyResult<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(SpotifyError::MissingCredentials);
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent("Tandem/1.0")
            .build()?;

        Ok(Self {
            http_client,
            client_id,
            client_secret,
            redirect_uri: redirect_uri.into(),
            api_url: SPOTIFY_API_URL.to_string(),
            accounts_url: SPOTIFY_ACCOUNTS_URL.to_string(),
        })
    }

    /// Point the client at different API and accounts hosts
    pub fn with_base_urls(mut self, api_url: impl Into<String>, accounts_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self.accounts_url = accounts_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the authorize URL the browser is redirected to
    pub fn authorize_url(&self, scopes: &[&str], state: &str) -> SpotifyResult<String> {
        let scope = scopes.join(" ");
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_url),
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("scope", scope.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| SpotifyError::InvalidInput(format!("invalid accounts URL: {}", e)))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> SpotifyResult<TokenGrant> {
        if code.is_empty() {
            return Err(SpotifyError::InvalidInput(
                "authorization code cannot be empty".to_string(),
            ));
        }

        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    /// Obtain a fresh access token from a refresh token
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> SpotifyResult<TokenGrant> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> SpotifyResult<TokenGrant> {
        let response = self
            .http_client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Spotify token exchange rejected");
            return Err(SpotifyError::TokenExchange(format!("{}: {}", status, body)));
        }

        Ok(response.json().await?)
    }

    /// Fetch the user's player state
    ///
    /// Returns `None` when Spotify reports no active playback (204).
    #[instrument(skip(self, access_token))]
    pub async fn current_playback(&self, access_token: &str) -> SpotifyResult<Option<CurrentPlayback>> {
        let response = self
            .send(self.api(Method::GET, "/me/player", access_token))
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            debug!("No active playback");
            return Ok(None);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Fetch the tracks queued after the current one
    #[instrument(skip(self, access_token))]
    pub async fn current_queue(&self, access_token: &str) -> SpotifyResult<Vec<Track>> {
        let response = self
            .send(self.api(Method::GET, "/me/player/queue", access_token))
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let queue: QueueResponse = response.json().await?;
        debug!(queue_len = queue.queue.len(), "Fetched player queue");
        Ok(queue.queue)
    }

    /// Search for tracks by free text and return the best match
    ///
    /// Returns `None` when the search yields no tracks.
    #[instrument(skip(self, access_token))]
    pub async fn search_track(&self, access_token: &str, query: &str) -> SpotifyResult<Option<Track>> {
        let query = Self::validate_query(query)?;

        let response = self
            .send(
                self.api(Method::GET, "/search", access_token)
                    .query(&[("q", query), ("type", "track"), ("limit", "1")]),
            )
            .await?;

        let results: SearchResponse = response.json().await?;
        let best = results
            .tracks
            .and_then(|page| page.items.into_iter().next());

        debug!(query = %query, found = best.is_some(), "Track search finished");
        Ok(best)
    }

    /// Start or resume playback, optionally at a specific track and offset
    #[instrument(skip(self, access_token))]
    pub async fn play(&self, access_token: &str, request: Option<PlayRequest>) -> SpotifyResult<()> {
        let mut builder = self.api(Method::PUT, "/me/player/play", access_token);
        builder = match request {
            Some(body) => builder.json(&body),
            None => builder.header(reqwest::header::CONTENT_LENGTH, 0),
        };
        self.send(builder).await?;
        Ok(())
    }

    /// Pause playback
    #[instrument(skip(self, access_token))]
    pub async fn pause(&self, access_token: &str) -> SpotifyResult<()> {
        self.send(
            self.api(Method::PUT, "/me/player/pause", access_token)
                .header(reqwest::header::CONTENT_LENGTH, 0),
        )
        .await?;
        Ok(())
    }

    /// Skip to the next track
    #[instrument(skip(self, access_token))]
    pub async fn skip_next(&self, access_token: &str) -> SpotifyResult<()> {
        self.send(
            self.api(Method::POST, "/me/player/next", access_token)
                .header(reqwest::header::CONTENT_LENGTH, 0),
        )
        .await?;
        Ok(())
    }

    /// Skip to the previous track
    #[instrument(skip(self, access_token))]
    pub async fn skip_previous(&self, access_token: &str) -> SpotifyResult<()> {
        self.send(
            self.api(Method::POST, "/me/player/previous", access_token)
                .header(reqwest::header::CONTENT_LENGTH, 0),
        )
        .await?;
        Ok(())
    }

    /// Append a track to the user's queue
    #[instrument(skip(self, access_token))]
    pub async fn add_to_queue(&self, access_token: &str, uri: &str) -> SpotifyResult<()> {
        if uri.trim().is_empty() {
            return Err(SpotifyError::InvalidInput(
                "track URI cannot be empty".to_string(),
            ));
        }

        self.send(
            self.api(Method::POST, "/me/player/queue", access_token)
                .query(&[("uri", uri)])
                .header(reqwest::header::CONTENT_LENGTH, 0),
        )
        .await?;
        Ok(())
    }

    /// Fetch the profile of the token's owner
    #[instrument(skip(self, access_token))]
    pub async fn current_user(&self, access_token: &str) -> SpotifyResult<UserProfile> {
        let response = self.send(self.api(Method::GET, "/me", access_token)).await?;
        Ok(response.json().await?)
    }

    fn validate_query(query: &str) -> SpotifyResult<&str> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(SpotifyError::InvalidInput(
                "search query cannot be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_QUERY_LENGTH {
            return Err(SpotifyError::InvalidInput(format!(
                "search query too long (max {} characters)",
                MAX_QUERY_LENGTH
            )));
        }
        Ok(trimmed)
    }

    fn api(&self, method: Method, path: &str, access_token: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(access_token)
    }

    /// Send a request and map non-success statuses to errors
    async fn send(&self, builder: RequestBuilder) -> SpotifyResult<Response> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(SpotifyError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Spotify API rate limited");
                Err(SpotifyError::RateLimited)
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&text)
                    .map(|e| e.error.message)
                    .unwrap_or(text);
                Err(SpotifyError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> SpotifyError {
    if e.is_timeout() {
        SpotifyError::Timeout
    } else {
        SpotifyError::Http(e)
    }
}
