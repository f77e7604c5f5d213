//! # Playback Coordinator
//!
//! The playback session (current track and album, play state, the loaded
//! audio resource and the playtime scratch values) is owned by one controller
//! task. [`PlaybackCoordinator`] is the cloneable handle to it:
//!
//! ```text
//!   handle ──Command──> controller ──load/play/pause/unload──> PlaybackAdapter
//!     ▲                    │  ▲
//!     └──watch snapshot────┘  └──PlaybackStatus (per resource)
//!                          │
//!                          └──StatsUpdate──> StatsWriter ──> TrackRepository
//! ```
//!
//! Commands are served one at a time, so at most one audio resource is ever
//! loaded: the previous one is released before the next is requested, and a
//! second `play_track` issued while the first is still loading is only
//! looked at once the first has resolved.
//!
//! The status channel of a resource is dropped together with the resource,
//! which is what keeps late updates from a released sound out of the
//! session.

use crate::error::{PlaybackError, Result};
use crate::queue::AlbumQueue;
use crate::snapshot::PlaybackSnapshot;
use crate::writer::{StatsUpdate, StatsWriter};
use bridge_traits::playback::{
    PlaybackAdapter, PlaybackMetadata, PlaybackSessionId, PlaybackStatus, SoundRequest,
};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_library::models::{Album, Track};
use core_library::repositories::TrackRepository;
use core_runtime::config::PlaybackSettings;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 32;

/// What a play request led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The track is loaded and playing.
    Started,
    /// The track has nothing to stream; the session is untouched.
    Skipped,
    /// The audio subsystem could not load the track.
    Failed(String),
}

impl PlayOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, PlayOutcome::Started)
    }
}

enum Command {
    PlayTrack {
        track: Track,
        album: Option<Album>,
        reply: oneshot::Sender<PlayOutcome>,
    },
    PlayAlbum {
        queue: AlbumQueue,
        reply: oneshot::Sender<PlayOutcome>,
    },
    Next {
        reply: oneshot::Sender<Option<PlayOutcome>>,
    },
    Previous {
        reply: oneshot::Sender<Option<PlayOutcome>>,
    },
    TogglePlayPause {
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the playback controller task.
///
/// Cloning is cheap; every clone drives the same session. The controller
/// shuts down, releasing any loaded resource, once the last handle is
/// dropped.
#[derive(Clone)]
pub struct PlaybackCoordinator {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    writer: StatsWriter,
}

impl PlaybackCoordinator {
    /// Spawn the controller and its stats writer on the current Tokio
    /// runtime.
    pub fn spawn(
        adapter: Arc<dyn PlaybackAdapter>,
        tracks: Arc<dyn TrackRepository>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        settings: PlaybackSettings,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::default());
        let (writer, _writer_task) = StatsWriter::spawn(tracks);

        let controller = Controller {
            adapter,
            clock,
            event_bus,
            settings,
            writer: writer.clone(),
            commands: command_rx,
            snapshot: snapshot_tx,
            status: None,
            session: Session::default(),
        };
        tokio::spawn(controller.run());

        info!(?settings, "Playback coordinator started");

        Self {
            commands: command_tx,
            snapshot: snapshot_rx,
            writer,
        }
    }

    /// Play a single track, leaving any album queue.
    pub async fn play_track(&self, track: Track, album: Option<Album>) -> Result<PlayOutcome> {
        self.request(|reply| Command::PlayTrack {
            track,
            album,
            reply,
        })
        .await
    }

    /// Play `tracks` of `album` in order, starting at `start_index`.
    pub async fn play_album(
        &self,
        album: Album,
        tracks: Vec<Track>,
        start_index: usize,
    ) -> Result<PlayOutcome> {
        let len = tracks.len();
        let queue = AlbumQueue::new(album, tracks, start_index).ok_or_else(|| {
            PlaybackError::InvalidQueue(format!(
                "start index {} out of range for {} tracks",
                start_index, len
            ))
        })?;

        self.request(|reply| Command::PlayAlbum { queue, reply }).await
    }

    /// Move to the next playable track of the album queue.
    ///
    /// Returns `None` without an active queue, or when the queue is
    /// exhausted, in which case playback is halted.
    pub async fn next(&self) -> Result<Option<PlayOutcome>> {
        self.request(|reply| Command::Next { reply }).await
    }

    /// Move to the previous playable track of the album queue. `None` at
    /// the start of the queue.
    pub async fn previous(&self) -> Result<Option<PlayOutcome>> {
        self.request(|reply| Command::Previous { reply }).await
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.request(|reply| Command::TogglePlayPause { reply }).await
    }

    /// Release the loaded resource and clear the session.
    pub async fn stop_playback(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.borrow().is_playing
    }

    pub fn current_track(&self) -> Option<Track> {
        self.snapshot.borrow().track.clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until every playtime and play-count write issued so far has been
    /// attempted.
    pub async fn flush_stats(&self) {
        self.writer.flush().await;
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| PlaybackError::CoordinatorClosed)?;
        response.await.map_err(|_| PlaybackError::CoordinatorClosed)
    }
}

#[derive(Default)]
struct Session {
    track: Option<Track>,
    album: Option<Album>,
    is_playing: bool,
    sound: Option<PlaybackSessionId>,
    /// Wall-clock moment playback last started or resumed.
    play_started_at: Option<DateTime<Utc>>,
    /// Latest position reported while playing.
    last_position_secs: f64,
    position: Duration,
    duration: Option<Duration>,
    queue: Option<AlbumQueue>,
}

enum Wake {
    Command(Option<Command>),
    Status(Option<PlaybackStatus>),
}

struct Controller {
    adapter: Arc<dyn PlaybackAdapter>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    settings: PlaybackSettings,
    writer: StatsWriter,
    commands: mpsc::Receiver<Command>,
    snapshot: watch::Sender<PlaybackSnapshot>,
    /// Status channel of the loaded resource.
    status: Option<mpsc::UnboundedReceiver<PlaybackStatus>>,
    session: Session,
}

async fn next_status(
    status: &mut Option<mpsc::UnboundedReceiver<PlaybackStatus>>,
) -> Option<PlaybackStatus> {
    match status {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl Controller {
    async fn run(mut self) {
        loop {
            let wake = tokio::select! {
                command = self.commands.recv() => Wake::Command(command),
                status = next_status(&mut self.status), if self.status.is_some() => {
                    Wake::Status(status)
                }
            };

            match wake {
                Wake::Command(Some(command)) => self.handle(command).await,
                Wake::Command(None) => break,
                Wake::Status(Some(status)) => self.on_status(status).await,
                Wake::Status(None) => {
                    debug!("Status channel closed by the audio subsystem");
                    self.status = None;
                }
            }
        }

        self.release_current().await;
        info!("Playback coordinator stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::PlayTrack {
                track,
                album,
                reply,
            } => {
                let outcome = self.start(track, album).await;
                if outcome.is_started() {
                    self.session.queue = None;
                }
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::PlayAlbum { queue, reply } => {
                let outcome = match queue.current().cloned() {
                    Some(track) => self.start(track, Some(queue.album().clone())).await,
                    None => PlayOutcome::Skipped,
                };
                if outcome.is_started() {
                    self.session.queue = Some(queue);
                }
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::Next { reply } => {
                let outcome = self.advance(true).await;
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::Previous { reply } => {
                let outcome = self.advance(false).await;
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::TogglePlayPause { reply } => {
                self.toggle().await;
                self.publish();
                let _ = reply.send(());
            }
            Command::Stop { reply } => {
                self.stop().await;
                self.publish();
                let _ = reply.send(());
            }
        }
    }

    /// Load `track` in place of whatever is loaded. Does not touch the queue.
    ///
    /// The current resource is released first, even when `track` turns out
    /// to have no audio; the current track and album are then kept, paused.
    async fn start(&mut self, track: Track, album: Option<Album>) -> PlayOutcome {
        self.release_current().await;

        let Some(url) = track.playable_url().map(str::to_string) else {
            debug!(track_id = %track.id, "Track has no audio URL, ignoring");
            return PlayOutcome::Skipped;
        };

        let metadata = PlaybackMetadata {
            track_id: Some(track.id.clone()),
            title: Some(track.title.clone()),
            album: album.as_ref().map(|a| a.title.clone()),
            artwork_url: album.as_ref().and_then(|a| a.cover_image_url.clone()),
            ..Default::default()
        };

        match self
            .adapter
            .load(SoundRequest::autoplay(url).with_metadata(metadata))
            .await
        {
            Ok(loaded) => {
                info!(track_id = %track.id, sound = %loaded.session, "Playback started");

                self.session.sound = Some(loaded.session);
                self.status = Some(loaded.status);
                self.session.is_playing = true;
                self.session.play_started_at = Some(self.clock.now());
                self.session.last_position_secs = 0.0;
                self.session.position = Duration::ZERO;
                self.session.duration = track
                    .duration_seconds
                    .map(|secs| Duration::from_secs(u64::from(secs)));

                self.emit(PlaybackEvent::Started {
                    track_id: track.id.clone(),
                    title: track.title.clone(),
                    album_id: album.as_ref().map(|a| a.id.clone()),
                });

                if self.settings.count_plays {
                    self.writer.submit(StatsUpdate::PlayCount {
                        track_id: track.id.clone(),
                        play_count: track.play_count + 1,
                    });
                }

                self.session.track = Some(track);
                self.session.album = album;
                PlayOutcome::Started
            }
            Err(e) => {
                error!(track_id = %track.id, error = %e, "Failed to load track");
                self.session.is_playing = false;
                self.emit(PlaybackEvent::Error {
                    track_id: Some(track.id.clone()),
                    message: e.to_string(),
                });
                PlayOutcome::Failed(e.to_string())
            }
        }
    }

    async fn advance(&mut self, forward: bool) -> Option<PlayOutcome> {
        let (index, track, album) = {
            let queue = self.session.queue.as_ref()?;
            let index = if forward {
                queue.next_index()
            } else {
                queue.previous_index()
            };
            match index {
                Some(index) => (index, queue.track_at(index)?.clone(), queue.album().clone()),
                None => {
                    if forward {
                        debug!("End of queue reached");
                        self.halt().await;
                    }
                    return None;
                }
            }
        };

        let outcome = self.start(track, Some(album)).await;
        if outcome.is_started() {
            if let Some(queue) = self.session.queue.as_mut() {
                queue.set_index(index);
            }
        }
        Some(outcome)
    }

    /// Stop the loaded resource without releasing it.
    async fn halt(&mut self) {
        let Some(sound) = self.session.sound else {
            return;
        };

        self.record_playtime();
        if let Err(e) = self.adapter.stop(sound).await {
            warn!(error = %e, "Failed to stop audio resource");
        }
        self.session.is_playing = false;

        if let Some(track_id) = self.current_track_id() {
            self.emit(PlaybackEvent::Stopped { track_id });
        }
    }

    async fn toggle(&mut self) {
        let Some(sound) = self.session.sound else {
            debug!("Nothing loaded, ignoring play/pause");
            return;
        };
        let track_id = self.current_track_id().unwrap_or_default();
        let position_secs = self.session.position.as_secs_f64();

        if self.session.is_playing {
            self.record_playtime();
            match self.adapter.pause(sound).await {
                Ok(()) => {
                    self.session.is_playing = false;
                    self.emit(PlaybackEvent::Paused {
                        track_id,
                        position_secs,
                    });
                }
                Err(e) => warn!(error = %e, "Failed to pause"),
            }
        } else {
            self.session.play_started_at = Some(self.clock.now());
            match self.adapter.play(sound).await {
                Ok(()) => {
                    self.session.is_playing = true;
                    self.emit(PlaybackEvent::Resumed {
                        track_id,
                        position_secs,
                    });
                }
                Err(e) => warn!(error = %e, "Failed to resume"),
            }
        }
    }

    async fn stop(&mut self) {
        let track_id = self.current_track_id();

        self.release_current().await;

        let session = &mut self.session;
        session.track = None;
        session.album = None;
        session.queue = None;
        session.is_playing = false;
        session.position = Duration::ZERO;
        session.duration = None;

        if let Some(track_id) = track_id {
            info!(%track_id, "Playback stopped");
            self.emit(PlaybackEvent::Stopped { track_id });
        }
    }

    /// Record playtime and unload the current resource, if any.
    async fn release_current(&mut self) {
        let Some(sound) = self.session.sound.take() else {
            return;
        };

        self.record_playtime();
        self.status = None;
        self.session.is_playing = false;

        if let Err(e) = self.adapter.unload(sound).await {
            warn!(%sound, error = %e, "Failed to unload audio resource");
        }
    }

    /// Queue `base + floor(last position)` for the current track when at
    /// least one whole second was heard. Scratch values are cleared either
    /// way.
    fn record_playtime(&mut self) {
        let session = &mut self.session;
        let started = session.play_started_at.take().is_some();
        let seconds = session.last_position_secs.max(0.0).floor() as u64;
        session.last_position_secs = 0.0;

        let Some(track) = session.track.as_ref().filter(|_| started) else {
            return;
        };
        if seconds == 0 {
            return;
        }

        let total_seconds = track.total_playtime_seconds + seconds;
        let track_id = track.id.clone();
        debug!(%track_id, seconds, total_seconds, "Recording playtime");

        self.writer.submit(StatsUpdate::Playtime {
            track_id: track_id.clone(),
            total_seconds,
        });
        self.emit(PlaybackEvent::PlaytimeRecorded {
            track_id,
            seconds,
            total_seconds,
        });
    }

    async fn on_status(&mut self, status: PlaybackStatus) {
        match status {
            PlaybackStatus::Progress {
                position,
                duration,
                is_playing,
            } => {
                self.session.position = position;
                if duration.is_some() {
                    self.session.duration = duration;
                }
                if is_playing {
                    self.session.last_position_secs = position.as_secs_f64();
                }
                self.publish();
            }
            PlaybackStatus::Finished => {
                self.session.is_playing = false;
                if let Some(track_id) = self.current_track_id() {
                    debug!(%track_id, "Track finished");
                    self.emit(PlaybackEvent::Completed { track_id });
                }
                self.publish();

                if self.settings.auto_advance && self.session.queue.is_some() {
                    self.advance(true).await;
                    self.publish();
                }
            }
        }
    }

    fn current_track_id(&self) -> Option<String> {
        self.session.track.as_ref().map(|t| t.id.clone())
    }

    fn emit(&self, event: PlaybackEvent) {
        self.event_bus.publish(CoreEvent::Playback(event));
    }

    fn publish(&self) {
        let session = &self.session;
        self.snapshot.send_replace(PlaybackSnapshot {
            track: session.track.clone(),
            album: session.album.clone(),
            is_playing: session.is_playing,
            has_resource: session.sound.is_some(),
            position: session.position,
            duration: session.duration,
            queue_index: session.queue.as_ref().map(AlbumQueue::index),
            queue_len: session.queue.as_ref().map_or(0, AlbumQueue::len),
        });
    }
}
