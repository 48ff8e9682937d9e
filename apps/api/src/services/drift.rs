//! Drift correction between a follower and its room's host

use serde::Serialize;

use crate::models::PlaybackSnapshot;

/// Default hysteresis band in milliseconds
pub const DEFAULT_DRIFT_TOLERANCE_MS: u64 = 1000;

/// Action a follower should take to match the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Correction {
    None,
    PlaySeek {
        #[serde(rename = "trackUri")]
        track_uri: String,
        #[serde(rename = "positionMs")]
        position_ms: u64,
    },
    Pause,
}

/// Decides corrections for followers from host snapshots
///
/// Position differences up to `tolerance_ms` are left alone so ordinary
/// polling jitter does not cause repeated seeks.
#[derive(Debug, Clone, Copy)]
pub struct DriftCorrector {
    tolerance_ms: u64,
}

impl Default for DriftCorrector {
    fn default() -> Self {
        Self::new(DEFAULT_DRIFT_TOLERANCE_MS)
    }
}

impl DriftCorrector {
    pub fn new(tolerance_ms: u64) -> Self {
        Self { tolerance_ms }
    }

    pub fn tolerance_ms(&self) -> u64 {
        self.tolerance_ms
    }

    /// Compare the follower's `local` state against `host` as of `now_ms`
    pub fn decide(
        &self,
        local: Option<&PlaybackSnapshot>,
        host: Option<&PlaybackSnapshot>,
        now_ms: i64,
    ) -> Correction {
        let Some(host) = host else {
            return Correction::None;
        };

        let target_ms = host.projected_position_ms(now_ms);
        let play_seek = || Correction::PlaySeek {
            track_uri: host.track_uri.clone(),
            position_ms: target_ms,
        };

        let Some(local) = local else {
            return play_seek();
        };

        if local.track_uri != host.track_uri {
            return play_seek();
        }

        if local.position_ms.abs_diff(target_ms) > self.tolerance_ms {
            return play_seek();
        }

        if !host.is_playing && local.is_playing {
            return Correction::Pause;
        }

        Correction::None
    }
}
