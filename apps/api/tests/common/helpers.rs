//! Test helper functions for API integration tests
//!
//! Provides utility functions for building app state, logging listeners
//! in, and driving the router.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tandem_api::{
    app_router,
    config::Config,
    models::{ParticipantRole, ProviderTokens, Session},
    AppState,
};
use tandem_shared_config::SpotifyConfig;
use tower::ServiceExt;

use super::MockProvider;

/// App state wired around a fresh [`MockProvider`]
pub fn test_state() -> (AppState, Arc<MockProvider>) {
    test_state_with_timeout(Duration::from_millis(3000))
}

/// Like [`test_state`], bounding each provider call by `provider_timeout`
pub fn test_state_with_timeout(provider_timeout: Duration) -> (AppState, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::new());
    let mut config = Config::for_testing(SpotifyConfig::with_base_url("http://127.0.0.1:9"));
    config.common.sync.provider_timeout_ms = provider_timeout.as_millis() as u64;
    let state = AppState::new(config, provider.clone());
    (state, provider)
}

/// Create a session for `access_token` and return it with its bearer token
pub fn login(state: &AppState, access_token: &str) -> (Session, String) {
    let session = state.sessions.create(ProviderTokens {
        access_token: access_token.to_string(),
        refresh_token: Some(format!("{}-refresh", access_token)),
    });
    let token = state.auth.issue_token(session.id).unwrap();
    (session, token)
}

/// Log in, declare `role` and join `room`
pub fn login_into_room(
    state: &AppState,
    access_token: &str,
    role: ParticipantRole,
    room: &str,
) -> (Session, String) {
    let (session, token) = login(state, access_token);
    state.sessions.set_role(session.id, role);
    state.sessions.set_room(session.id, room.to_string());
    let session = state.sessions.get(session.id).unwrap();
    (session, token)
}

/// Send one request through the router, returning status and JSON body
///
/// A non-JSON body comes back as a JSON string.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

pub async fn get(state: &AppState, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app_router(state.clone()), Method::GET, uri, token, None).await
}

pub async fn post(state: &AppState, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    send(app_router(state.clone()), Method::POST, uri, token, body).await
}
