//! Playback bridge traits and supporting audio types.
//!
//! The host owns the platform media API (decoding, output routing, media
//! sessions). The core only asks it to load a URI, control the resulting
//! resource, and release it. Status updates flow back over an explicit
//! per-resource channel instead of a callback:
//!
//! ```text
//! load() ──> LoadedSound { session, status }
//!                                   │
//!                                   ├─ Progress { .. }   (zero or more)
//!                                   └─ Finished          (at most once, terminal)
//! ```
//!
//! Dropping the receiver is how the core stops listening to a resource it has
//! released; adapters must tolerate sends failing after that point.

use crate::error::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier for an audio resource held by a host adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata associated with a load request. Implementations may use this to
/// populate platform media sessions or lock-screen controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackMetadata {
    /// Opaque track identifier.
    pub track_id: Option<String>,
    /// Display title for the track.
    pub title: Option<String>,
    /// Album or collection name.
    pub album: Option<String>,
    /// Artwork URI.
    pub artwork_url: Option<String>,
    /// Arbitrary extra fields.
    pub extra: HashMap<String, String>,
}

/// Request to acquire an audio resource for a URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundRequest {
    /// Remote or local URI of the audio asset.
    pub uri: String,
    /// Start playing as soon as the resource is ready.
    pub autoplay: bool,
    /// Optional metadata surfaced to the host.
    pub metadata: PlaybackMetadata,
}

impl SoundRequest {
    /// Request a resource that starts playing immediately.
    pub fn autoplay(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            autoplay: true,
            metadata: PlaybackMetadata::default(),
        }
    }

    /// Attach metadata to the request.
    pub fn with_metadata(mut self, metadata: PlaybackMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Status update reported by the host for a loaded resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackStatus {
    /// Periodic position report, delivered at the host's own cadence.
    Progress {
        /// Current playback offset.
        position: Duration,
        /// Total duration, once known.
        duration: Option<Duration>,
        /// Whether the resource is currently producing audio.
        is_playing: bool,
    },
    /// The resource played through to its natural end.
    Finished,
}

impl PlaybackStatus {
    /// Returns `true` for the terminal event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackStatus::Finished)
    }
}

/// A freshly acquired audio resource and its status channel.
#[derive(Debug)]
pub struct LoadedSound {
    /// Handle used for subsequent control calls.
    pub session: PlaybackSessionId,
    /// Status updates for this resource only.
    pub status: mpsc::UnboundedReceiver<PlaybackStatus>,
}

/// Sending half handed to adapter implementations.
///
/// Enforces the channel contract: any number of `Progress` updates followed by
/// at most one `Finished`, after which nothing else is delivered.
#[derive(Debug)]
pub struct StatusSender {
    tx: mpsc::UnboundedSender<PlaybackStatus>,
    finished: AtomicBool,
}

impl StatusSender {
    /// Create a linked sender/receiver pair for a new resource.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PlaybackStatus>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                finished: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// Report a position update. Returns `false` if the update was dropped
    /// because the resource already finished or nobody is listening.
    pub fn progress(&self, position: Duration, duration: Option<Duration>, is_playing: bool) -> bool {
        if self.finished.load(Ordering::Acquire) {
            return false;
        }
        self.tx
            .send(PlaybackStatus::Progress {
                position,
                duration,
                is_playing,
            })
            .is_ok()
    }

    /// Report natural completion. Only the first call delivers an event.
    pub fn finished(&self) -> bool {
        if self.finished.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.tx.send(PlaybackStatus::Finished).is_ok()
    }

    /// Whether the listener has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Platform media API driving native audio output.
///
/// Every resource returned by [`load`](PlaybackAdapter::load) must eventually
/// be passed to [`unload`](PlaybackAdapter::unload); the core guarantees it
/// holds at most one resource at a time.
#[async_trait::async_trait]
pub trait PlaybackAdapter: Send + Sync {
    /// Acquire a resource for the requested URI.
    async fn load(&self, request: SoundRequest) -> Result<LoadedSound>;

    /// Begin or resume playback.
    async fn play(&self, session: PlaybackSessionId) -> Result<()>;

    /// Pause playback without releasing the resource.
    async fn pause(&self, session: PlaybackSessionId) -> Result<()>;

    /// Stop playback and rewind to the start, keeping the resource loaded.
    async fn stop(&self, session: PlaybackSessionId) -> Result<()>;

    /// Release the resource. Status updates for it cease.
    async fn unload(&self, session: PlaybackSessionId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_unique() {
        let a = PlaybackSessionId::new();
        let b = PlaybackSessionId::new();
        assert_ne!(a, b);
        assert_eq!(a, PlaybackSessionId::from_uuid(*a.as_uuid()));
    }

    #[test]
    fn autoplay_request_defaults() {
        let request = SoundRequest::autoplay("https://cdn.example.com/a.mp3");
        assert!(request.autoplay);
        assert_eq!(request.uri, "https://cdn.example.com/a.mp3");
        assert_eq!(request.metadata, PlaybackMetadata::default());
    }

    #[tokio::test]
    async fn status_sender_delivers_single_terminal_event() {
        let (sender, mut rx) = StatusSender::channel();

        assert!(sender.progress(Duration::from_secs(1), None, true));
        assert!(sender.finished());
        assert!(!sender.finished());
        assert!(!sender.progress(Duration::from_secs(2), None, true));
        drop(sender);

        assert!(matches!(rx.recv().await, Some(PlaybackStatus::Progress { .. })));
        assert_eq!(rx.recv().await, Some(PlaybackStatus::Finished));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn status_sender_notices_dropped_listener() {
        let (sender, rx) = StatusSender::channel();
        drop(rx);
        assert!(sender.is_closed());
        assert!(!sender.progress(Duration::ZERO, None, true));
    }
}
