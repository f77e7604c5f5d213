//! Album repository trait

use crate::error::Result;
use crate::models::{Album, NewAlbum};
use async_trait::async_trait;

#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Find an album by its ID. Missing albums are `Ok(None)`.
    async fn find_by_id(&self, id: &str) -> Result<Option<Album>>;

    /// Albums of an artist, most recently created first.
    async fn list_by_artist(&self, artist_id: &str) -> Result<Vec<Album>>;

    /// Insert a new album and return the stored row.
    async fn insert(&self, album: &NewAlbum) -> Result<Album>;
}
