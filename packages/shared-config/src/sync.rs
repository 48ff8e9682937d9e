//! Playback synchronization tuning

use std::time::Duration;

use crate::{parse_env, ConfigError, ConfigResult};

/// Timing parameters for the poll, broadcast and correction cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Seconds between local snapshot polls (drives host broadcasts)
    pub poll_interval_secs: u64,

    /// Position drift tolerated before a follower is re-seeked
    pub drift_tolerance_ms: u64,

    /// Upper bound on a single provider call inside a poll cycle
    pub provider_timeout_ms: u64,
}

impl SyncConfig {
    /// Load sync configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            poll_interval_secs: parse_env("SYNC_POLL_INTERVAL_SECS", 5)?,
            drift_tolerance_ms: parse_env("SYNC_DRIFT_TOLERANCE_MS", 1000)?,
            provider_timeout_ms: parse_env("SYNC_PROVIDER_TIMEOUT_MS", 3000)?,
        };

        if config.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SYNC_POLL_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Provider call bound as a [`Duration`]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            drift_tolerance_ms: 1000,
            provider_timeout_ms: 3000,
        }
    }
}
