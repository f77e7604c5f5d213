//! Track repository trait

use crate::error::Result;
use crate::models::{NewTrack, Track};
use async_trait::async_trait;

/// Track repository interface for data access operations
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Find a track by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>>;

    /// Tracks of an album ordered by `track_number` ascending.
    async fn list_by_album(&self, album_id: &str) -> Result<Vec<Track>>;

    /// Case-insensitive substring match on the title.
    async fn search_by_title(&self, term: &str, limit: usize) -> Result<Vec<Track>>;

    /// Insert several tracks in a single request.
    async fn insert_many(&self, tracks: &[NewTrack]) -> Result<Vec<Track>>;

    /// Overwrite the cumulative playtime counter.
    async fn update_playtime(&self, track_id: &str, total_seconds: u64) -> Result<()>;

    /// Overwrite the play counter.
    async fn update_play_count(&self, track_id: &str, play_count: u64) -> Result<()>;
}
