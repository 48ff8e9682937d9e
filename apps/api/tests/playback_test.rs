//! Integration tests for playback control and drift correction over HTTP

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::*;
use serde_json::json;
use tandem_api::models::ParticipantRole;

#[tokio::test]
async fn test_play_reports_current_track() {
    let (state, provider) = test_state();
    provider.set_playing("listener", "spotify:track:abc", 1_000, false);
    let (_, token) = login(&state, "listener");

    let (status, body) = post(&state, "/playback/play", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["track"], "Track abc");
    assert_eq!(
        provider.calls_for("listener"),
        vec![ProviderCall::Play {
            token: "listener".to_string(),
            track_uri: None,
            position_ms: None,
        }]
    );
}

#[tokio::test]
async fn test_play_with_nothing_loaded() {
    let (state, _) = test_state();
    let (_, token) = login(&state, "listener");

    let (status, body) = post(&state, "/playback/play", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["track"], "No track playing");
}

#[tokio::test]
async fn test_transport_commands_use_callers_credentials() {
    let (state, provider) = test_state();
    let (_, token) = login(&state, "listener");

    for path in ["/playback/pause", "/playback/next", "/playback/previous"] {
        let (status, _) = post(&state, path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT, "{}", path);
    }

    let token = "listener".to_string();
    assert_eq!(
        provider.calls(),
        vec![
            ProviderCall::Pause { token: token.clone() },
            ProviderCall::Next { token: token.clone() },
            ProviderCall::Previous { token },
        ]
    );
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway() {
    let (state, provider) = test_state();
    let (_, token) = login(&state, "listener");
    provider.fail_all();

    let (status, body) = post(&state, "/playback/pause", Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "PROVIDER_ERROR");
}

#[tokio::test]
async fn test_current_snapshot() {
    let (state, provider) = test_state();
    provider.set_playing("listener", "spotify:track:abc", 61_000, true);
    let (_, token) = login(&state, "listener");

    let (status, body) = get(&state, "/playback/current", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trackUri"], "spotify:track:abc");
    assert_eq!(body["positionMs"], 61_000);
    assert_eq!(body["isPlaying"], true);
}

#[tokio::test]
async fn test_current_when_idle_is_null_track() {
    let (state, _) = test_state();
    let (_, token) = login(&state, "listener");

    let (status, body) = get(&state, "/playback/current", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["track"].is_null());
}

#[tokio::test]
async fn test_sync_seeks_follower_onto_host_track() {
    let (state, provider) = test_state();
    provider.set_playing("follower", "spotify:track:old", 5_000, true);
    let (_, token) = login_into_room(&state, "follower", ParticipantRole::Client, "lobby");

    let host = json!({
        "trackUri": "spotify:track:new",
        "trackName": "New",
        "artistNames": "Someone",
        "positionMs": 30_000,
        "isPlaying": false,
        "capturedAtMs": Utc::now().timestamp_millis(),
    });
    let (status, body) = post(&state, "/playback/sync", Some(&token), Some(host)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "play-seek");
    assert_eq!(body["trackUri"], "spotify:track:new");
    assert_eq!(body["positionMs"], 30_000);

    // Host is paused, so the seek is followed by a pause
    assert_eq!(
        provider.calls_for("follower"),
        vec![
            ProviderCall::Play {
                token: "follower".to_string(),
                track_uri: Some("spotify:track:new".to_string()),
                position_ms: Some(30_000),
            },
            ProviderCall::Pause {
                token: "follower".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_sync_within_tolerance_does_nothing() {
    let (state, provider) = test_state();
    provider.set_playing("follower", "spotify:track:same", 10_400, false);
    let (_, token) = login_into_room(&state, "follower", ParticipantRole::Client, "lobby");

    let host = json!({
        "trackUri": "spotify:track:same",
        "positionMs": 10_000,
        "isPlaying": false,
        "capturedAtMs": Utc::now().timestamp_millis(),
    });
    let (status, body) = post(&state, "/playback/sync", Some(&token), Some(host)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "none");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_sync_ignores_stale_host_snapshot() {
    let (state, provider) = test_state();
    provider.set_playing("follower", "spotify:track:old", 0, false);
    let (_, token) = login_into_room(&state, "follower", ParticipantRole::Client, "lobby");
    let captured_at = Utc::now().timestamp_millis();

    let newer = json!({
        "trackUri": "spotify:track:b",
        "positionMs": 2_000,
        "isPlaying": false,
        "capturedAtMs": captured_at,
    });
    let older = json!({
        "trackUri": "spotify:track:a",
        "positionMs": 1_000,
        "isPlaying": false,
        "capturedAtMs": captured_at - 5_000,
    });

    let (_, first) = post(&state, "/playback/sync", Some(&token), Some(newer)).await;
    let (_, second) = post(&state, "/playback/sync", Some(&token), Some(older)).await;

    assert_eq!(first["action"], "play-seek");
    assert_eq!(second["action"], "none");
}

#[tokio::test]
async fn test_future_capture_time_does_not_shadow_later_snapshots() {
    let (state, provider) = test_state();
    provider.set_playing("follower", "spotify:track:old", 0, false);
    let (_, token) = login_into_room(&state, "follower", ParticipantRole::Client, "lobby");

    let skewed = json!({
        "trackUri": "spotify:track:a",
        "positionMs": 1_000,
        "isPlaying": false,
        "capturedAtMs": Utc::now().timestamp_millis() + 3_600_000,
    });
    let (_, first) = post(&state, "/playback/sync", Some(&token), Some(skewed)).await;
    assert_eq!(first["action"], "play-seek");

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let fresh = json!({
        "trackUri": "spotify:track:b",
        "positionMs": 2_000,
        "isPlaying": false,
        "capturedAtMs": Utc::now().timestamp_millis(),
    });
    let (status, second) = post(&state, "/playback/sync", Some(&token), Some(fresh)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["action"], "play-seek");
    assert_eq!(second["trackUri"], "spotify:track:b");
}

#[tokio::test]
async fn test_host_never_corrects_against_itself() {
    let (state, provider) = test_state();
    provider.set_playing("host", "spotify:track:x", 0, true);
    let (_, token) = login_into_room(&state, "host", ParticipantRole::Host, "lobby");

    let host = json!({
        "trackUri": "spotify:track:y",
        "positionMs": 90_000,
        "isPlaying": true,
        "capturedAtMs": Utc::now().timestamp_millis(),
    });
    let (status, body) = post(&state, "/playback/sync", Some(&token), Some(host)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "none");
    assert!(provider.calls().is_empty());
}
