//! Streaming provider OAuth configuration

use std::fmt;

use crate::{get_env_or_default, get_required_env, ConfigError, ConfigResult};

/// Default Web API base URL
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Default accounts service base URL
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Provider OAuth client configuration
#[derive(Clone)]
pub struct SpotifyConfig {
    /// OAuth client ID
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Callback URL registered with the provider
    pub redirect_uri: String,

    /// Web API base URL
    pub api_url: String,

    /// Accounts service base URL (authorize + token exchange)
    pub accounts_url: String,
}

impl fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("api_url", &self.api_url)
            .field("accounts_url", &self.accounts_url)
            .finish()
    }
}

impl SpotifyConfig {
    /// Load provider configuration from environment variables
    ///
    /// `SPOTIFY_CLIENT_ID` and `SPOTIFY_CLIENT_SECRET` are required.
    pub fn from_env() -> ConfigResult<Self> {
        let redirect_uri =
            get_env_or_default("REDIRECT_URI", "http://localhost:3000/auth/callback");
        if !redirect_uri.starts_with("http://") && !redirect_uri.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(
                "REDIRECT_URI".to_string(),
                redirect_uri,
            ));
        }

        Ok(Self {
            client_id: get_required_env("SPOTIFY_CLIENT_ID")?,
            client_secret: get_required_env("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri,
            api_url: get_env_or_default("SPOTIFY_API_URL", DEFAULT_API_URL),
            accounts_url: get_env_or_default("SPOTIFY_ACCOUNTS_URL", DEFAULT_ACCOUNTS_URL),
        })
    }

    /// Create a configuration pointing both services at one base URL (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            api_url: format!("{}/v1", base_url.trim_end_matches('/')),
            accounts_url: base_url,
        }
    }
}
