//! Business logic services
//!
//! - Provider capability trait over the streaming service
//! - Session store and login flow
//! - Drift correction and playback orchestration

pub mod auth;
pub mod drift;
pub mod playback;
pub mod provider;
pub mod session;

pub use auth::AuthService;
pub use drift::{Correction, DriftCorrector};
pub use playback::PlaybackService;
pub use provider::PlaybackProvider;
pub use session::SessionStore;
