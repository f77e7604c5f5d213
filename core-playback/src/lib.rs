//! # Playback Module
//!
//! Owns the single active playback session.
//!
//! ## Overview
//!
//! This module handles:
//! - Track transitions through the host's [`PlaybackAdapter`](bridge_traits::PlaybackAdapter)
//! - Play/pause/stop and album queues with auto-advance
//! - Cumulative playtime and play counts, persisted in issue order
//!
//! The session lives inside a controller task. Callers talk to it through a
//! [`PlaybackCoordinator`] handle (commands) and observe it through
//! [`PlaybackSnapshot`]s published on a watch channel.

pub mod coordinator;
pub mod error;
pub mod queue;
pub mod snapshot;
pub mod writer;

pub use coordinator::{PlayOutcome, PlaybackCoordinator};
pub use error::{PlaybackError, Result};
pub use queue::AlbumQueue;
pub use snapshot::PlaybackSnapshot;
pub use writer::{StatsUpdate, StatsWriter};
