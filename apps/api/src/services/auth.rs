//! Authentication service for Tandem
//!
//! Login goes through the provider's OAuth consent flow. A completed login
//! creates an in-memory session and hands the browser a signed session token
//! (HS256) whose subject is the session ID.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::session::TOKEN_ISSUER;
use crate::models::{Claims, Session};
use crate::services::provider::PlaybackProvider;
use crate::services::session::SessionStore;

/// How long a login `state` value stays redeemable
const LOGIN_STATE_TTL_MS: i64 = 10 * 60 * 1000;

#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn PlaybackProvider>,
    sessions: SessionStore,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
    /// Outstanding OAuth `state` values -> issue time (ms)
    pending_logins: Arc<DashMap<String, i64>>,
}

impl AuthService {
    pub fn new(
        provider: Arc<dyn PlaybackProvider>,
        sessions: SessionStore,
        secret: &str,
        token_ttl_secs: i64,
    ) -> Self {
        Self {
            provider,
            sessions,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
            pending_logins: Arc::new(DashMap::new()),
        }
    }

    /// Start a login: returns the provider consent URL carrying a fresh `state`
    pub fn begin_login(&self) -> ApiResult<String> {
        let now = Utc::now().timestamp_millis();
        self.pending_logins
            .retain(|_, issued_at| now - *issued_at < LOGIN_STATE_TTL_MS);

        let state = Uuid::new_v4().simple().to_string();
        let url = self.provider.authorize_url(&state)?;
        self.pending_logins.insert(state, now);

        Ok(url)
    }

    /// Finish a login from the OAuth callback
    ///
    /// The `state` value is single use. Returns the new session and its
    /// session token.
    pub async fn complete_login(&self, code: &str, state: &str) -> ApiResult<(Session, String)> {
        let now = Utc::now().timestamp_millis();
        match self.pending_logins.remove(state) {
            Some((_, issued_at)) if now - issued_at < LOGIN_STATE_TTL_MS => {}
            _ => {
                return Err(ApiError::InvalidToken(
                    "unknown or expired login state".to_string(),
                ))
            }
        }

        if code.is_empty() {
            return Err(ApiError::ValidationError(
                "authorization code is required".to_string(),
            ));
        }

        let tokens = self.provider.authenticate(code).await?;
        let session = self.sessions.create(tokens);
        let token = self.issue_token(session.id)?;

        tracing::info!(session_id = %session.id, "Login completed");

        Ok((session, token))
    }

    /// Sign a session token for `session_id`
    pub fn issue_token(&self, session_id: Uuid) -> ApiResult<String> {
        let claims = Claims::new(session_id, self.token_ttl_secs);
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify a session token and load its live session
    pub fn verify_token(&self, token: &str) -> ApiResult<Session> {
        let mut validation = Validation::default();
        validation.set_issuer(&[TOKEN_ISSUER]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| ApiError::InvalidToken(e.to_string()))?;

        self.sessions
            .get(data.claims.sub)
            .ok_or(ApiError::Unauthorized)
    }

    /// Replace the session's access token using its refresh token
    pub async fn refresh(&self, session_id: Uuid) -> ApiResult<()> {
        let session = self.sessions.get(session_id).ok_or(ApiError::Unauthorized)?;
        let refresh_token = session
            .tokens
            .refresh_token
            .as_deref()
            .ok_or(ApiError::Unauthorized)?;

        let tokens = self.provider.refresh(refresh_token).await?;
        self.sessions.update_tokens(session_id, tokens);

        tracing::debug!(session_id = %session_id, "Provider token refreshed");
        Ok(())
    }

    /// Drop the session, returning it so the caller can release its room
    pub fn logout(&self, session_id: Uuid) -> Option<Session> {
        self.sessions.remove(session_id)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tandem_spotify_client::SpotifyClient;
    use tandem_test_utils::MockSpotifyServer;

    const SECRET: &str = "test-secret-that-is-at-least-32-chars";

    fn service(server: &MockSpotifyServer) -> AuthService {
        let client = SpotifyClient::new("id", "secret", "http://localhost:3000/auth/callback")
            .unwrap()
            .with_base_urls(server.api_url(), server.accounts_url());
        AuthService::new(Arc::new(client), SessionStore::new(), SECRET, 3600)
    }

    fn state_of(url: &str) -> String {
        let url = url::Url::parse(url).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let server = MockSpotifyServer::start().await;
        server.mock_token_exchange("access-1", "refresh-1").await;
        let auth = service(&server);

        let url = auth.begin_login().unwrap();
        assert!(url.contains("/authorize"));
        let state = state_of(&url);

        let (session, token) = auth.complete_login("code", &state).await.unwrap();
        assert_eq!(session.access_token(), "access-1");

        let verified = auth.verify_token(&token).unwrap();
        assert_eq!(verified.id, session.id);
    }

    #[tokio::test]
    async fn test_login_state_is_single_use() {
        let server = MockSpotifyServer::start().await;
        server.mock_token_exchange("access-1", "refresh-1").await;
        let auth = service(&server);

        let state = state_of(&auth.begin_login().unwrap());
        auth.complete_login("code", &state).await.unwrap();

        let result = auth.complete_login("code", &state).await;
        assert_matches!(result, Err(ApiError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_unknown_state_rejected() {
        let server = MockSpotifyServer::start().await;
        let auth = service(&server);

        let result = auth.complete_login("code", "forged").await;
        assert_matches!(result, Err(ApiError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_rejected_code_surfaces_provider_error() {
        let server = MockSpotifyServer::start().await;
        server.mock_token_rejected().await;
        let auth = service(&server);

        let state = state_of(&auth.begin_login().unwrap());
        let result = auth.complete_login("bad", &state).await;

        assert_matches!(result, Err(ApiError::Provider(_)));
        assert!(auth.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage_and_foreign_tokens() {
        let server = MockSpotifyServer::start().await;
        let auth = service(&server);

        assert_matches!(auth.verify_token("not-a-jwt"), Err(ApiError::InvalidToken(_)));

        let other = AuthService::new(
            Arc::new(
                SpotifyClient::new("id", "secret", "http://localhost/cb").unwrap(),
            ),
            SessionStore::new(),
            "a-completely-different-secret-value",
            3600,
        );
        let foreign = other.issue_token(Uuid::new_v4()).unwrap();
        assert_matches!(auth.verify_token(&foreign), Err(ApiError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_token_for_ended_session_is_unauthorized() {
        let server = MockSpotifyServer::start().await;
        server.mock_token_exchange("access-1", "refresh-1").await;
        let auth = service(&server);

        let state = state_of(&auth.begin_login().unwrap());
        let (session, token) = auth.complete_login("code", &state).await.unwrap();
        assert!(auth.logout(session.id).is_some());

        assert_matches!(auth.verify_token(&token), Err(ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_expired_session_is_evicted_on_verify() {
        let server = MockSpotifyServer::start().await;
        server.mock_token_exchange("access-1", "refresh-1").await;
        let client = SpotifyClient::new("id", "secret", "http://localhost:3000/auth/callback")
            .unwrap()
            .with_base_urls(server.api_url(), server.accounts_url());
        // Sessions expire the moment they are created
        let auth = AuthService::new(Arc::new(client), SessionStore::with_ttl_secs(0), SECRET, 3600);

        let state = state_of(&auth.begin_login().unwrap());
        let (_, token) = auth.complete_login("code", &state).await.unwrap();

        assert_matches!(auth.verify_token(&token), Err(ApiError::Unauthorized));
        assert!(auth.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_updates_access_token() {
        let server = MockSpotifyServer::start().await;
        server.mock_token_exchange("access-1", "refresh-1").await;
        let auth = service(&server);

        let state = state_of(&auth.begin_login().unwrap());
        let (session, _) = auth.complete_login("code", &state).await.unwrap();

        server.mock_token_refresh("access-2").await;
        auth.refresh(session.id).await.unwrap();

        let refreshed = auth.sessions().get(session.id).unwrap();
        assert_eq!(refreshed.access_token(), "access-2");
        assert_eq!(refreshed.tokens.refresh_token.as_deref(), Some("refresh-1"));
    }
}
