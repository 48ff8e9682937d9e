//! Shared configuration types for Tandem services
//!
//! This crate provides the environment-driven configuration used by the
//! sync server: deployment mode, provider OAuth settings and the timing
//! parameters of the poll/broadcast/correct cycle.

mod error;
mod spotify;
mod sync;

pub use error::{ConfigError, ConfigResult};
pub use spotify::{SpotifyConfig, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL};
pub use sync::SyncConfig;

use std::env;

/// Common configuration shared between all services
#[derive(Debug, Clone)]
pub struct CommonConfig {
    /// Provider OAuth configuration
    pub spotify: SpotifyConfig,

    /// Sync cycle timing
    pub sync: SyncConfig,

    /// Environment mode (development, staging, production)
    pub environment: Environment,
}

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        })
    }
}

impl Environment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl CommonConfig {
    /// Load common configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            spotify: SpotifyConfig::from_env()?,
            sync: SyncConfig::from_env()?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse()
                .unwrap_or_default(),
        })
    }
}

/// Log filter directives from `RUST_LOG`, falling back to `LOG_LEVEL`
///
/// `None` when neither is set, leaving the default to the binary.
pub fn log_filter_from_env() -> Option<String> {
    env::var("RUST_LOG")
        .or_else(|_| env::var("LOG_LEVEL"))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Helper function to get a required environment variable
pub fn get_required_env(name: &str) -> ConfigResult<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

/// Helper function to get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
