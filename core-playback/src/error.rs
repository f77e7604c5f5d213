//! # Playback Error Types
//!
//! Audio subsystem and persistence failures are logged by the coordinator
//! rather than returned; callers only see failures of the handle itself.

use thiserror::Error;

/// Errors returned by [`PlaybackCoordinator`](crate::PlaybackCoordinator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The controller task is gone; no further commands can be served.
    #[error("Playback coordinator is not running")]
    CoordinatorClosed,

    /// Album queue request that cannot be satisfied.
    #[error("Invalid queue: {0}")]
    InvalidQueue(String),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
