//! Spotify API error types

use thiserror::Error;

/// Spotify API client errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Client credentials are missing
    #[error("client credentials are required for Spotify API access")]
    MissingCredentials,

    /// Invalid input provided to API method
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse Spotify response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Access token rejected (expired or revoked)
    #[error("Spotify rejected the access token")]
    Unauthorized,

    /// Spotify API returned an error
    #[error("Spotify API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Authorization code or refresh token exchange failed
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Rate limited by Spotify
    #[error("Rate limited by Spotify API")]
    RateLimited,

    /// Request timeout
    #[error("Request to Spotify timed out")]
    Timeout,
}

/// Result type for Spotify operations
pub type SpotifyResult<T> = Result<T, SpotifyError>;
