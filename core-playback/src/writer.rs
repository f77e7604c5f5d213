//! Ordered, fire-and-forget persistence of listening statistics.
//!
//! The coordinator must never wait on the backend, yet writes for the same
//! track must land in the order they were issued. A single background task
//! drains an unbounded queue and applies each update in turn. Failures are
//! logged and dropped.

use core_library::repositories::TrackRepository;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A single counter overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsUpdate {
    Playtime { track_id: String, total_seconds: u64 },
    PlayCount { track_id: String, play_count: u64 },
}

enum WriterMessage {
    Write(StatsUpdate),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Cloning shares the same queue.
#[derive(Clone)]
pub struct StatsWriter {
    tx: mpsc::UnboundedSender<WriterMessage>,
}

impl StatsWriter {
    /// Spawn the writer task on the current Tokio runtime.
    ///
    /// The task ends once every handle is dropped and the queue is drained.
    pub fn spawn(tracks: Arc<dyn TrackRepository>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(tracks, rx));
        (Self { tx }, handle)
    }

    /// Queue an update. Never blocks.
    pub fn submit(&self, update: StatsUpdate) {
        if self.tx.send(WriterMessage::Write(update)).is_err() {
            warn!("Stats writer is gone, dropping update");
        }
    }

    /// Wait until every update queued before this call has been attempted.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriterMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

async fn run(tracks: Arc<dyn TrackRepository>, mut rx: mpsc::UnboundedReceiver<WriterMessage>) {
    while let Some(message) = rx.recv().await {
        match message {
            WriterMessage::Write(update) => apply(tracks.as_ref(), update).await,
            WriterMessage::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("Stats writer stopped");
}

async fn apply(tracks: &dyn TrackRepository, update: StatsUpdate) {
    let result = match &update {
        StatsUpdate::Playtime {
            track_id,
            total_seconds,
        } => tracks.update_playtime(track_id, *total_seconds).await,
        StatsUpdate::PlayCount {
            track_id,
            play_count,
        } => tracks.update_play_count(track_id, *play_count).await,
    };

    match result {
        Ok(()) => debug!(?update, "Stats persisted"),
        Err(e) => warn!(?update, error = %e, "Failed to persist stats"),
    }
}
