//! Artist repository trait

use crate::error::Result;
use crate::models::{Artist, ArtistChanges, NewArtist};
use async_trait::async_trait;

/// Artist repository interface for data access operations
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Find an artist by its ID
    ///
    /// # Returns
    /// - `Ok(Some(artist))` if found
    /// - `Ok(None)` if not found
    async fn find_by_id(&self, id: &str) -> Result<Option<Artist>>;

    /// Every artist, ordered by name.
    async fn list_by_name(&self) -> Result<Vec<Artist>>;

    /// Artists owned by a profile, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Artist>>;

    /// Case-insensitive substring match on the name.
    async fn search_by_name(&self, term: &str, limit: usize) -> Result<Vec<Artist>>;

    /// Insert a new artist and return the stored row.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the name is blank, or the backend error.
    async fn insert(&self, artist: &NewArtist) -> Result<Artist>;

    /// Replace the editable fields of an artist.
    async fn update(&self, id: &str, changes: &ArtistChanges) -> Result<()>;

    /// Delete an artist by ID.
    async fn delete(&self, id: &str) -> Result<()>;
}
