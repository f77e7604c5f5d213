//! # Catalog
//!
//! Read-side operations backing the browse, search and detail screens.
//! Every call goes straight to the repositories; nothing is cached.

use core_library::models::{AlbumDetail, Artist, ArtistDetail, SearchResults};
use core_library::{AlbumRepository, ArtistRepository, TrackRepository};
use core_runtime::config::SearchSettings;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::Result;

#[derive(Clone)]
pub struct CatalogService {
    artists: Arc<dyn ArtistRepository>,
    albums: Arc<dyn AlbumRepository>,
    tracks: Arc<dyn TrackRepository>,
    search: SearchSettings,
}

impl CatalogService {
    pub fn new(
        artists: Arc<dyn ArtistRepository>,
        albums: Arc<dyn AlbumRepository>,
        tracks: Arc<dyn TrackRepository>,
        search: SearchSettings,
    ) -> Self {
        Self {
            artists,
            albums,
            tracks,
            search,
        }
    }

    /// All artists, ordered by name.
    pub async fn list_artists(&self) -> Result<Vec<Artist>> {
        Ok(self.artists.list_by_name().await?)
    }

    /// Artist with its albums, newest first. `None` when the artist does
    /// not exist.
    #[instrument(skip(self))]
    pub async fn artist_detail(&self, artist_id: &str) -> Result<Option<ArtistDetail>> {
        let (artist, albums) = tokio::try_join!(
            self.artists.find_by_id(artist_id),
            self.albums.list_by_artist(artist_id),
        )?;

        Ok(artist.map(|artist| ArtistDetail { artist, albums }))
    }

    /// Album and its tracks in track-number order, fetched together.
    #[instrument(skip(self))]
    pub async fn album_detail(&self, album_id: &str) -> Result<AlbumDetail> {
        let (album, tracks) = tokio::try_join!(
            self.albums.find_by_id(album_id),
            self.tracks.list_by_album(album_id),
        )?;

        if album.is_none() {
            debug!(album_id, "Album not found");
        }

        Ok(AlbumDetail { album, tracks })
    }

    /// Case-insensitive substring search over artist names and track
    /// titles. Short queries return nothing without touching the backend.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let term = query.trim();
        if term.chars().count() < self.search.min_query_chars {
            return Ok(SearchResults::default());
        }

        let limit = self.search.result_limit;
        let (artists, tracks) = tokio::try_join!(
            self.artists.search_by_name(term, limit),
            self.tracks.search_by_title(term, limit),
        )?;

        debug!(
            artists = artists.len(),
            tracks = tracks.len(),
            "Search completed"
        );
        Ok(SearchResults { artists, tracks })
    }

    /// Artists owned by a profile, newest first.
    pub async fn artists_owned_by(&self, profile_id: &str) -> Result<Vec<Artist>> {
        Ok(self.artists.list_by_owner(profile_id).await?)
    }
}
