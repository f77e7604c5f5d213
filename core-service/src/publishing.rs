//! # Publishing
//!
//! Write-side operations behind the artist and album forms.
//!
//! Assets are uploaded before the rows that reference them are written.
//! Removing an old image is best-effort: a failed delete is logged and the
//! operation carries on.

use bridge_traits::http::HttpClient;
use core_library::models::{
    non_empty, Album, AlbumDetail, Artist, ArtistChanges, NewAlbum, NewArtist, NewTrack,
};
use core_library::storage::{AssetFolder, AssetUploader, Bucket};
use core_library::{AlbumRepository, ArtistRepository, LibraryError, TrackRepository};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::assets::AssetSource;
use crate::error::Result;

/// Fields of the artist create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistForm {
    pub name: String,
    pub bio: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    /// Newly picked image. `None` keeps the current one.
    pub image: Option<AssetSource>,
}

impl ArtistForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn validated_name(&self) -> Result<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LibraryError::invalid("name", "Artist name is required").into());
        }
        Ok(name.to_string())
    }
}

/// One track row of the album form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackForm {
    pub title: String,
    pub track_number: u32,
    /// Audio already hosted somewhere.
    pub audio_url: String,
    /// Picked audio to upload. Ignored when `audio_url` is set.
    pub audio: Option<AssetSource>,
    pub duration_seconds: Option<u32>,
}

impl TrackForm {
    /// A row counts when it has a title and some audio.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && (!self.audio_url.trim().is_empty() || self.audio.is_some())
    }
}

/// Fields of the album creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumForm {
    pub title: String,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub cover: Option<AssetSource>,
    pub tracks: Vec<TrackForm>,
}

impl Default for AlbumForm {
    /// An empty form starts with one blank track row.
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            release_date: None,
            cover: None,
            tracks: vec![TrackForm {
                track_number: 1,
                ..TrackForm::default()
            }],
        }
    }
}

impl AlbumForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Append a blank track row numbered after the last one.
    pub fn add_track(&mut self) -> &mut TrackForm {
        let track_number = self.tracks.len() as u32 + 1;
        self.tracks.push(TrackForm {
            track_number,
            ..TrackForm::default()
        });
        let last = self.tracks.len() - 1;
        &mut self.tracks[last]
    }

    /// Drop a track row and renumber the rest 1..n. Out-of-range indexes
    /// are ignored.
    pub fn remove_track(&mut self, index: usize) -> Option<TrackForm> {
        if index >= self.tracks.len() {
            return None;
        }
        let removed = self.tracks.remove(index);
        for (i, track) in self.tracks.iter_mut().enumerate() {
            track.track_number = i as u32 + 1;
        }
        Some(removed)
    }

    pub fn complete_tracks(&self) -> impl Iterator<Item = &TrackForm> {
        self.tracks.iter().filter(|t| t.is_complete())
    }
}

#[derive(Clone)]
pub struct PublishingService {
    artists: Arc<dyn ArtistRepository>,
    albums: Arc<dyn AlbumRepository>,
    tracks: Arc<dyn TrackRepository>,
    uploader: AssetUploader,
    http_client: Arc<dyn HttpClient>,
    event_bus: EventBus,
}

impl PublishingService {
    pub fn new(
        artists: Arc<dyn ArtistRepository>,
        albums: Arc<dyn AlbumRepository>,
        tracks: Arc<dyn TrackRepository>,
        uploader: AssetUploader,
        http_client: Arc<dyn HttpClient>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            artists,
            albums,
            tracks,
            uploader,
            http_client,
            event_bus,
        }
    }

    async fn upload(&self, folder: AssetFolder, source: &AssetSource) -> Result<String> {
        let data = source.read(self.http_client.as_ref()).await?;
        Ok(self.uploader.upload(folder, &source.name(), data).await?)
    }

    async fn discard_image(&self, url: &str) {
        if let Err(e) = self.uploader.delete_by_url(Bucket::Images, url).await {
            warn!(error = %e, "Failed to delete previous image");
        }
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_artist(&self, owner_id: &str, form: ArtistForm) -> Result<Artist> {
        let name = form.validated_name()?;

        let image_url = match &form.image {
            Some(source) => Some(self.upload(AssetFolder::ArtistImages, source).await?),
            None => None,
        };

        let artist = self
            .artists
            .insert(&NewArtist {
                owner_id: owner_id.to_string(),
                name,
                bio: non_empty(form.bio),
                genre: non_empty(form.genre),
                description: non_empty(form.description),
                website: non_empty(form.website),
                image_url,
            })
            .await?;

        info!(artist_id = %artist.id, "Artist created");
        self.event_bus.publish(CoreEvent::Library(LibraryEvent::ArtistCreated {
            artist_id: artist.id.clone(),
            name: artist.name.clone(),
        }));
        Ok(artist)
    }

    /// Save the edit form. A new image replaces the old one.
    #[instrument(skip(self, form))]
    pub async fn update_artist(&self, artist_id: &str, form: ArtistForm) -> Result<()> {
        let name = form.validated_name()?;
        let current = self
            .artists
            .find_by_id(artist_id)
            .await?
            .ok_or_else(|| LibraryError::not_found("artist", artist_id))?;

        let image_replaced = form.image.is_some();
        let image_url = match &form.image {
            Some(source) => {
                if let Some(old) = current.image_url.as_deref() {
                    self.discard_image(old).await;
                }
                Some(self.upload(AssetFolder::ArtistImages, source).await?)
            }
            None => current.image_url,
        };

        self.artists
            .update(
                artist_id,
                &ArtistChanges {
                    name,
                    bio: non_empty(form.bio),
                    genre: non_empty(form.genre),
                    description: non_empty(form.description),
                    website: non_empty(form.website),
                    image_url,
                },
            )
            .await?;

        info!(image_replaced, "Artist updated");
        self.event_bus.publish(CoreEvent::Library(LibraryEvent::ArtistUpdated {
            artist_id: artist_id.to_string(),
            image_replaced,
        }));
        Ok(())
    }

    /// Delete an artist and its image. Albums and tracks go with the row on
    /// the backend side.
    #[instrument(skip(self, artist), fields(artist_id = %artist.id))]
    pub async fn delete_artist(&self, artist: &Artist) -> Result<()> {
        if let Some(url) = artist.image_url.as_deref() {
            self.discard_image(url).await;
        }

        self.artists.delete(&artist.id).await?;

        info!("Artist deleted");
        self.event_bus.publish(CoreEvent::Library(LibraryEvent::ArtistDeleted {
            artist_id: artist.id.clone(),
        }));
        Ok(())
    }

    /// Create an album with its complete track rows.
    ///
    /// The album row is written before the track audio is uploaded; the
    /// uploads run concurrently and the tracks are inserted in one call.
    #[instrument(skip(self, form), fields(title = %form.title))]
    pub async fn create_album(&self, artist_id: &str, form: AlbumForm) -> Result<AlbumDetail> {
        let title = form.title.trim();
        if title.is_empty() {
            return Err(LibraryError::invalid("title", "Album title is required").into());
        }

        let tracks: Vec<&TrackForm> = form.complete_tracks().collect();
        if tracks.is_empty() {
            return Err(LibraryError::invalid(
                "tracks",
                "At least one track with title and audio file is required",
            )
            .into());
        }

        let cover_image_url = match &form.cover {
            Some(source) => Some(self.upload(AssetFolder::AlbumCovers, source).await?),
            None => None,
        };

        let album: Album = self
            .albums
            .insert(&NewAlbum {
                artist_id: artist_id.to_string(),
                title: title.to_string(),
                description: non_empty(form.description.clone()),
                cover_image_url,
                release_date: non_empty(form.release_date.clone()),
            })
            .await?;

        let rows = try_join_all(tracks.iter().map(|track| self.track_row(&album.id, track))).await?;
        let stored = self.tracks.insert_many(&rows).await?;

        info!(album_id = %album.id, tracks = stored.len(), "Album created");
        self.event_bus.publish(CoreEvent::Library(LibraryEvent::AlbumCreated {
            album_id: album.id.clone(),
            artist_id: album.artist_id.clone(),
            title: album.title.clone(),
            track_count: stored.len() as u32,
        }));

        Ok(AlbumDetail {
            album: Some(album),
            tracks: stored,
        })
    }

    async fn track_row(&self, album_id: &str, track: &TrackForm) -> Result<NewTrack> {
        let hosted = track.audio_url.trim();
        let audio_url = match (&track.audio, hosted.is_empty()) {
            (Some(source), true) => self.upload(AssetFolder::TrackAudio, source).await?,
            _ => hosted.to_string(),
        };

        Ok(NewTrack {
            album_id: album_id.to_string(),
            title: track.title.trim().to_string(),
            track_number: track.track_number,
            audio_url,
            duration_seconds: track.duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, url: &str) -> TrackForm {
        TrackForm {
            title: title.to_string(),
            audio_url: url.to_string(),
            ..TrackForm::default()
        }
    }

    #[test]
    fn test_new_form_has_one_blank_track() {
        let form = AlbumForm::new("Blue");
        assert_eq!(form.tracks.len(), 1);
        assert_eq!(form.tracks[0].track_number, 1);
        assert_eq!(form.complete_tracks().count(), 0);
    }

    #[test]
    fn test_add_and_remove_renumber() {
        let mut form = AlbumForm::new("Blue");
        form.add_track().title = "Two".to_string();
        form.add_track().title = "Three".to_string();
        assert_eq!(
            form.tracks.iter().map(|t| t.track_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let removed = form.remove_track(0).unwrap();
        assert_eq!(removed.track_number, 1);
        assert_eq!(form.tracks[0].title, "Two");
        assert_eq!(
            form.tracks.iter().map(|t| t.track_number).collect::<Vec<_>>(),
            vec![1, 2]
        );

        assert!(form.remove_track(5).is_none());
    }

    #[test]
    fn test_complete_track_needs_title_and_audio() {
        assert!(track("Intro", "https://cdn/a.mp3").is_complete());
        assert!(!track("  ", "https://cdn/a.mp3").is_complete());
        assert!(!track("Intro", " ").is_complete());

        let mut picked = track("Intro", "");
        picked.audio = Some(AssetSource::memory("a.mp3", &b"ID3"[..]));
        assert!(picked.is_complete());
    }
}
