//! In-memory session store
//!
//! Each entry holds the provider tokens, joined room, declared role and bound
//! socket for one browser. Entries live until logout or until their session
//! token would have expired, whichever comes first.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{ParticipantRole, ProviderTokens, Session};

/// Session lifetime when none is configured
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Session>>,
    ttl_secs: i64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl_secs(DEFAULT_SESSION_TTL_SECS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl_secs(ttl_secs: i64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl_secs,
        }
    }

    /// Create a session for freshly issued provider tokens
    ///
    /// Expired sessions are swept out first.
    pub fn create(&self, tokens: ProviderTokens) -> Session {
        let now = Utc::now().timestamp_millis();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        let swept = before.saturating_sub(self.sessions.len());
        if swept > 0 {
            tracing::debug!(swept, "Expired sessions swept");
        }

        let session = Session::new(tokens, self.ttl_secs);
        self.sessions.insert(session.id, session.clone());
        tracing::debug!(session_id = %session.id, "Session created");
        session
    }

    /// Live session for `session_id`; an expired one is evicted instead
    pub fn get(&self, session_id: Uuid) -> Option<Session> {
        let now = Utc::now().timestamp_millis();
        if self
            .sessions
            .remove_if(&session_id, |_, s| s.is_expired(now))
            .is_some()
        {
            tracing::debug!(session_id = %session_id, "Session expired");
            return None;
        }
        self.sessions.get(&session_id).map(|s| s.value().clone())
    }

    /// Record the joined room, returning the previous one
    pub fn set_room(&self, session_id: Uuid, room: String) -> Option<Option<String>> {
        self.sessions
            .get_mut(&session_id)
            .map(|mut s| {
                // A new room means a new host stream
                s.last_host_capture_ms = None;
                s.room.replace(room)
            })
    }

    pub fn set_role(&self, session_id: Uuid, role: ParticipantRole) -> bool {
        match self.sessions.get_mut(&session_id) {
            Some(mut s) => {
                s.role = role;
                true
            }
            None => false,
        }
    }

    /// Bind a socket to the session, returning the connection it replaces
    pub fn bind_connection(&self, session_id: Uuid, connection_id: Uuid) -> Option<Uuid> {
        self.sessions
            .get_mut(&session_id)
            .and_then(|mut s| s.connection_id.replace(connection_id))
    }

    /// Clear the binding if it still points at `connection_id`
    pub fn unbind_connection(&self, session_id: Uuid, connection_id: Uuid) -> bool {
        match self.sessions.get_mut(&session_id) {
            Some(mut s) if s.connection_id == Some(connection_id) => {
                s.connection_id = None;
                true
            }
            _ => false,
        }
    }

    /// Swap in refreshed tokens, keeping the old refresh token if none was issued
    pub fn update_tokens(&self, session_id: Uuid, tokens: ProviderTokens) -> bool {
        match self.sessions.get_mut(&session_id) {
            Some(mut s) => {
                let refresh_token = tokens.refresh_token.or_else(|| s.tokens.refresh_token.take());
                s.tokens = ProviderTokens {
                    access_token: tokens.access_token,
                    refresh_token,
                };
                true
            }
            None => false,
        }
    }

    /// Note that a host snapshot captured at `captured_at_ms` is being acted on
    ///
    /// Returns `false` when a newer (or the same) snapshot was already
    /// recorded, in which case the caller should drop this one.
    pub fn record_host_snapshot(&self, session_id: Uuid, captured_at_ms: i64) -> bool {
        match self.sessions.get_mut(&session_id) {
            Some(mut s) => match s.last_host_capture_ms {
                Some(last) if captured_at_ms <= last => false,
                _ => {
                    s.last_host_capture_ms = Some(captured_at_ms);
                    true
                }
            },
            None => false,
        }
    }

    pub fn remove(&self, session_id: Uuid) -> Option<Session> {
        let removed = self.sessions.remove(&session_id).map(|(_, s)| s);
        if removed.is_some() {
            tracing::debug!(session_id = %session_id, "Session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(access: &str) -> ProviderTokens {
        ProviderTokens {
            access_token: access.to_string(),
            refresh_token: Some("refresh".to_string()),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new();
        let session = store.create(tokens("a"));

        let fetched = store.get(session.id).unwrap();
        assert_eq!(fetched.access_token(), "a");
        assert_eq!(fetched.role, ParticipantRole::Unassigned);
        assert!(fetched.room.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_room_returns_previous() {
        let store = SessionStore::new();
        let id = store.create(tokens("a")).id;

        assert_eq!(store.set_room(id, "A".to_string()), Some(None));
        assert_eq!(
            store.set_room(id, "B".to_string()),
            Some(Some("A".to_string()))
        );
        assert_eq!(store.set_room(Uuid::new_v4(), "C".to_string()), None);
    }

    #[test]
    fn test_rebinding_replaces_connection() {
        let store = SessionStore::new();
        let id = store.create(tokens("a")).id;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert_eq!(store.bind_connection(id, first), None);
        assert_eq!(store.bind_connection(id, second), Some(first));

        // The stale socket closing must not clear the new binding
        assert!(!store.unbind_connection(id, first));
        assert_eq!(store.get(id).unwrap().connection_id, Some(second));
        assert!(store.unbind_connection(id, second));
    }

    #[test]
    fn test_update_tokens_keeps_refresh_token() {
        let store = SessionStore::new();
        let id = store.create(tokens("a")).id;

        store.update_tokens(
            id,
            ProviderTokens {
                access_token: "b".to_string(),
                refresh_token: None,
            },
        );

        let session = store.get(id).unwrap();
        assert_eq!(session.access_token(), "b");
        assert_eq!(session.tokens.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn test_stale_host_snapshots_rejected() {
        let store = SessionStore::new();
        let id = store.create(tokens("a")).id;

        assert!(store.record_host_snapshot(id, 1_000));
        assert!(store.record_host_snapshot(id, 2_000));
        assert!(!store.record_host_snapshot(id, 1_500));
        assert!(!store.record_host_snapshot(id, 2_000));

        // Joining another room resets the watermark
        store.set_room(id, "other".to_string());
        assert!(store.record_host_snapshot(id, 1_500));
    }

    #[test]
    fn test_expired_session_is_evicted_on_read() {
        let store = SessionStore::new();
        let id = store.create(tokens("a")).id;

        store.sessions.get_mut(&id).unwrap().expires_at = 0;

        assert!(store.get(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_sweeps_expired_sessions() {
        let store = SessionStore::new();
        let stale = store.create(tokens("a")).id;
        let live = store.create(tokens("b")).id;
        store.sessions.get_mut(&stale).unwrap().expires_at = 0;

        let fresh = store.create(tokens("c")).id;

        assert_eq!(store.len(), 2);
        assert!(store.get(live).is_some());
        assert!(store.get(fresh).is_some());
    }

    #[test]
    fn test_session_expiry_follows_ttl() {
        let store = SessionStore::with_ttl_secs(60);
        let session = store.create(tokens("a"));
        let now = Utc::now().timestamp_millis();

        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + 61_000));
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        let id = store.create(tokens("a")).id;

        assert!(store.remove(id).is_some());
        assert!(store.get(id).is_none());
        assert!(store.is_empty());
    }
}
