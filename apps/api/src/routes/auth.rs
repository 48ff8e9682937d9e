//! Authentication REST route handlers
//!
//! - `GET /auth/login` - Redirect to the provider consent page
//! - `GET /auth/callback` - Finish login, hand the browser its session token
//! - `POST /auth/refresh` - Refresh the provider access token
//! - `POST /auth/logout` - End the session and leave its room
//! - `GET /auth/me` - Display name of the logged-in listener

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::ApiResult;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::state::AppState;

pub fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
}

/// OAuth callback query parameters
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when consent was denied
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<String>,
}

/// Send the browser to the provider's consent page
async fn login(State(state): State<AppState>) -> ApiResult<Redirect> {
    let url = state.auth.begin_login()?;
    Ok(Redirect::to(&url))
}

/// Finish the OAuth flow
///
/// Always redirects to the post-login page: `#token=...` on success,
/// `#error=...` on failure.
async fn callback(State(state): State<AppState>, Query(params): Query<CallbackParams>) -> Redirect {
    let base = state.config.post_login_redirect.as_str();

    if let Some(error) = params.error {
        tracing::info!(error = %error, "Provider login declined");
        return Redirect::to(&fragment_redirect(base, "error", &error));
    }

    let code = params.code.unwrap_or_default();
    let login_state = params.state.unwrap_or_default();

    match state.auth.complete_login(&code, &login_state).await {
        Ok((_, token)) => Redirect::to(&fragment_redirect(base, "token", &token)),
        Err(e) => {
            e.log();
            Redirect::to(&fragment_redirect(base, "error", &e.to_string()))
        }
    }
}

fn fragment_redirect(base: &str, key: &str, value: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    format!("{}#{}={}", base, key, encoded)
}

async fn refresh(State(state): State<AppState>, auth: AuthUser) -> ApiResult<impl IntoResponse> {
    state.auth.refresh(auth.session.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Some(session) = state.auth.logout(auth.session.id) {
        if let Some(connection_id) = session.connection_id {
            state.rooms.leave(connection_id);
        }
        tracing::info!(session_id = %session.id, "Logged out");
    }
    StatusCode::NO_CONTENT
}

/// Display name of the caller, `null` when logged out or the provider fails
async fn me(State(state): State<AppState>, auth: MaybeAuthUser) -> Json<MeResponse> {
    let Some(session) = auth.session else {
        return Json(MeResponse { user: None });
    };

    let user = match state.provider.current_user(session.access_token()).await {
        Ok(name) => Some(name),
        Err(e) => {
            tracing::warn!(session_id = %session.id, error = %e, "Failed to fetch user profile");
            None
        }
    };

    Json(MeResponse { user })
}
