//! Shared test utilities for Tandem workspace
//!
//! This crate provides mock implementations of external services for testing
//! without network dependencies.
//!
//! # Mock Services
//!
//! - [`MockSpotifyServer`] - Mock Spotify Web API and accounts service
//!
//! # Example
//!
//! ```rust,ignore
//! use tandem_test_utils::{MockSpotifyServer, TrackFixture};
//!
//! #[tokio::test]
//! async fn test_with_mocks() {
//!     let spotify = MockSpotifyServer::start().await;
//!     spotify.mock_queue(&[TrackFixture::new("abc", "Song")]).await;
//!
//!     // Use spotify.api_url() to configure your client
//! }
//! ```

mod spotify;

pub use spotify::{MockSpotifyServer, TrackFixture};
