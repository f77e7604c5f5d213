//! Observable playback state.

use core_library::models::{Album, Track};
use serde::Serialize;
use std::time::Duration;

/// Point-in-time view of the playback session, published after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub track: Option<Track>,
    pub album: Option<Album>,
    pub is_playing: bool,
    /// Whether an audio resource is currently loaded.
    pub has_resource: bool,
    /// Latest position reported by the audio subsystem.
    pub position: Duration,
    pub duration: Option<Duration>,
    /// Index of the current track within the album queue, if one is active.
    pub queue_index: Option<usize>,
    pub queue_len: usize,
}

impl PlaybackSnapshot {
    /// Fraction of the track played, in `0.0..=1.0`. Zero while the duration
    /// is unknown.
    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(duration) if !duration.is_zero() => {
                (self.position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn track_id(&self) -> Option<&str> {
        self.track.as_ref().map(|t| t.id.as_str())
    }

    pub fn has_next(&self) -> bool {
        matches!(self.queue_index, Some(index) if index + 1 < self.queue_len)
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.queue_index, Some(index) if index > 0)
    }
}
