//! API server configuration

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tandem_shared_config::{CommonConfig, Environment, SpotifyConfig, SyncConfig};

use crate::services::session::DEFAULT_SESSION_TTL_SECS;

/// Minimum required length for SESSION_SECRET to be considered secure
const MIN_SESSION_SECRET_LENGTH: usize = 32;


/// API server configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 3000)
    pub port: u16,

    /// HMAC secret for session tokens
    pub session_secret: String,

    /// Session token lifetime in seconds
    pub session_ttl_secs: i64,

    /// Where the OAuth callback sends the browser afterwards
    pub post_login_redirect: String,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("common", &self.common)
            .field("port", &self.port)
            .field("session_secret", &"[REDACTED]")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("post_login_redirect", &self.post_login_redirect)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode `SESSION_SECRET` must be set and at least 32
    /// characters long. In development a default is used with a warning.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        )
        .unwrap_or_default();

        let session_secret = Self::load_session_secret(environment.is_production())?;

        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        Ok(Self {
            common,

            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT value")?,

            session_secret,

            session_ttl_secs: match env::var("SESSION_TTL_SECS") {
                Ok(value) => value.parse().context("Invalid SESSION_TTL_SECS value")?,
                Err(_) => DEFAULT_SESSION_TTL_SECS,
            },

            post_login_redirect: env::var("POST_LOGIN_REDIRECT")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "/".to_string()),

            cors_allowed_origins: env::var("CORS_ORIGINS").ok().map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        })
    }

    /// Build a configuration for tests and local tooling without touching the environment
    pub fn for_testing(spotify: SpotifyConfig) -> Self {
        Self {
            common: CommonConfig {
                spotify,
                sync: SyncConfig::default(),
                environment: Environment::Development,
            },
            port: 0,
            session_secret: "test-secret-that-is-at-least-32-chars".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            post_login_redirect: "/".to_string(),
            cors_allowed_origins: None,
        }
    }

    /// Load and validate SESSION_SECRET
    ///
    /// In production:
    /// - SESSION_SECRET must be explicitly set
    /// - Must be at least MIN_SESSION_SECRET_LENGTH characters
    ///
    /// In development: uses a default value with a warning
    fn load_session_secret(is_production: bool) -> Result<String> {
        match env::var("SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => {
                if is_production && secret.len() < MIN_SESSION_SECRET_LENGTH {
                    bail!(
                        "SESSION_SECRET must be at least {} characters in production (got {})",
                        MIN_SESSION_SECRET_LENGTH,
                        secret.len()
                    );
                }
                Ok(secret)
            }
            _ if is_production => {
                bail!(
                    "SESSION_SECRET environment variable is required in production. \
                     Please set a secure secret of at least {} characters.",
                    MIN_SESSION_SECRET_LENGTH
                );
            }
            _ => {
                tracing::warn!(
                    "SESSION_SECRET not set, using insecure default. \
                     This is only acceptable in development mode."
                );
                Ok("development-secret-change-in-production".to_string())
            }
        }
    }

    /// Get provider configuration
    pub fn spotify(&self) -> &SpotifyConfig {
        &self.common.spotify
    }

    /// Get sync timing configuration
    pub fn sync(&self) -> &SyncConfig {
        &self.common.sync
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}
