//! Spotify Web API client for Tandem
//!
//! This crate wraps the parts of the Spotify Web API a listening room needs:
//! - OAuth authorization code and refresh token exchange
//! - Player state, queue and profile reads
//! - Play/pause/skip/seek and queue additions
//! - Track search
//!
//! # Example
//!
//! ```rust,no_run
//! use tandem_spotify_client::{PlayRequest, SpotifyClient};
//!
//! # async fn example(access_token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let client = SpotifyClient::new("client_id", "client_secret", "http://localhost:3000/auth/callback")?;
//!
//! if let Some(playback) = client.current_playback(access_token).await? {
//!     println!("playing: {}", playback.is_playing);
//! }
//!
//! client
//!     .play(access_token, Some(PlayRequest::track_at("spotify:track:abc", 30_000)))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;

pub use client::{SpotifyClient, PLAYER_SCOPES, SPOTIFY_ACCOUNTS_URL, SPOTIFY_API_URL};
pub use error::{SpotifyError, SpotifyResult};
pub use models::{ArtistRef, CurrentPlayback, PlayRequest, TokenGrant, Track, UserProfile};
