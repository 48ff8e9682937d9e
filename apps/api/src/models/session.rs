//! Per-session state, participant roles and session token claims

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer embedded in session tokens
pub const TOKEN_ISSUER: &str = "tandem";

/// How a participant relates to its room's sync stream
///
/// The role is declared by the client and not verified by the server. Any
/// participant may claim `Host`; two hosts in one room will both broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    /// Authoritative playback, broadcast to the room
    Host,
    /// Corrected to match the host
    Client,
    /// Joined but neither broadcasting nor syncing
    #[default]
    Unassigned,
}

impl ParticipantRole {
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host)
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Client => write!(f, "client"),
            Self::Unassigned => write!(f, "unassigned"),
        }
    }
}

/// Provider OAuth tokens held for a session
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// In-memory state for one logged-in browser
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,

    pub tokens: ProviderTokens,

    /// Room the session has joined, if any
    pub room: Option<String>,

    pub role: ParticipantRole,

    /// Real-time connection currently bound to this session
    pub connection_id: Option<Uuid>,

    /// Capture time of the newest host snapshot acted on
    pub last_host_capture_ms: Option<i64>,

    /// Unix timestamp (ms) after which the session is gone
    pub expires_at: i64,
}

impl Session {
    pub fn new(tokens: ProviderTokens, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: Uuid::new_v4(),
            tokens,
            room: None,
            role: ParticipantRole::default(),
            connection_id: None,
            last_host_capture_ms: None,
            expires_at: now.saturating_add(ttl_secs.saturating_mul(1000)),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Session ID
    pub sub: Uuid,

    /// Issued at timestamp (Unix epoch)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch)
    pub exp: i64,

    /// Issuer
    pub iss: String,
}

impl Claims {
    pub fn new(session_id: Uuid, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: session_id,
            iat: now,
            exp: now + ttl_secs,
            iss: TOKEN_ISSUER.to_string(),
        }
    }
}
