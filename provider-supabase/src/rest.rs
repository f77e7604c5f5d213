//! Catalog repositories over PostgREST
//!
//! One type per table; all of them share a [`SupabaseClient`].

use async_trait::async_trait;
use core_library::error::{LibraryError, Result};
use core_library::models::{
    Album, Artist, ArtistChanges, NewAlbum, NewArtist, NewTrack, Track, UserProfile,
};
use core_library::query::{Order, TableQuery};
use core_library::repositories::{
    AlbumRepository, ArtistRepository, TrackRepository, UserProfileRepository,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::connector::SupabaseClient;

const USER_PROFILES: &str = "user_profiles";
const ARTISTS: &str = "artists";
const ALBUMS: &str = "albums";
const TRACKS: &str = "tracks";

fn by_id(table: &str, id: &str) -> TableQuery {
    TableQuery::from_table(table).eq("id", id)
}

/// The single row a write echoed back.
fn first_row<T>(rows: Vec<T>, table: &str) -> Result<T> {
    rows.into_iter().next().ok_or_else(|| {
        LibraryError::Serialization(format!("{} write returned no row", table))
    })
}

// =============================================================================
// user_profiles
// =============================================================================

pub struct SupabaseUserProfileRepository {
    client: Arc<SupabaseClient>,
}

impl SupabaseUserProfileRepository {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserProfileRepository for SupabaseUserProfileRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>> {
        Ok(self.client.select_one(by_id(USER_PROFILES, id)).await?)
    }

    #[instrument(skip(self, profile), fields(id = %profile.id))]
    async fn upsert(&self, profile: &UserProfile) -> Result<UserProfile> {
        let rows = self.client.upsert(USER_PROFILES, profile).await?;
        info!(account_type = %profile.account_type, "Profile saved");
        first_row(rows, USER_PROFILES)
    }
}

// =============================================================================
// artists
// =============================================================================

pub struct SupabaseArtistRepository {
    client: Arc<SupabaseClient>,
}

impl SupabaseArtistRepository {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtistRepository for SupabaseArtistRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Artist>> {
        Ok(self.client.select_one(by_id(ARTISTS, id)).await?)
    }

    #[instrument(skip(self))]
    async fn list_by_name(&self) -> Result<Vec<Artist>> {
        let query = TableQuery::from_table(ARTISTS).order_by("name", Order::Ascending);
        Ok(self.client.select(&query).await?)
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Artist>> {
        let query = TableQuery::from_table(ARTISTS)
            .eq("owner_id", owner_id)
            .order_by("created_at", Order::Descending);
        Ok(self.client.select(&query).await?)
    }

    #[instrument(skip(self))]
    async fn search_by_name(&self, term: &str, limit: usize) -> Result<Vec<Artist>> {
        let query = TableQuery::from_table(ARTISTS)
            .contains("name", term)
            .limit(limit);
        let artists: Vec<Artist> = self.client.select(&query).await?;
        debug!(count = artists.len(), "Artist search finished");
        Ok(artists)
    }

    #[instrument(skip(self, artist), fields(name = %artist.name))]
    async fn insert(&self, artist: &NewArtist) -> Result<Artist> {
        let rows = self.client.insert(ARTISTS, artist).await?;
        let artist: Artist = first_row(rows, ARTISTS)?;
        info!(artist_id = %artist.id, "Artist inserted");
        Ok(artist)
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: &str, changes: &ArtistChanges) -> Result<()> {
        self.client.update(&by_id(ARTISTS, id), changes).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&by_id(ARTISTS, id)).await?;
        info!("Artist deleted");
        Ok(())
    }
}

// =============================================================================
// albums
// =============================================================================

pub struct SupabaseAlbumRepository {
    client: Arc<SupabaseClient>,
}

impl SupabaseAlbumRepository {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlbumRepository for SupabaseAlbumRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Album>> {
        Ok(self.client.select_one(by_id(ALBUMS, id)).await?)
    }

    #[instrument(skip(self))]
    async fn list_by_artist(&self, artist_id: &str) -> Result<Vec<Album>> {
        let query = TableQuery::from_table(ALBUMS)
            .eq("artist_id", artist_id)
            .order_by("created_at", Order::Descending);
        Ok(self.client.select(&query).await?)
    }

    #[instrument(skip(self, album), fields(title = %album.title))]
    async fn insert(&self, album: &NewAlbum) -> Result<Album> {
        let rows = self.client.insert(ALBUMS, album).await?;
        let album: Album = first_row(rows, ALBUMS)?;
        info!(album_id = %album.id, "Album inserted");
        Ok(album)
    }
}

// =============================================================================
// tracks
// =============================================================================

pub struct SupabaseTrackRepository {
    client: Arc<SupabaseClient>,
}

impl SupabaseTrackRepository {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TrackRepository for SupabaseTrackRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>> {
        Ok(self.client.select_one(by_id(TRACKS, id)).await?)
    }

    #[instrument(skip(self))]
    async fn list_by_album(&self, album_id: &str) -> Result<Vec<Track>> {
        let query = TableQuery::from_table(TRACKS)
            .eq("album_id", album_id)
            .order_by("track_number", Order::Ascending);
        Ok(self.client.select(&query).await?)
    }

    #[instrument(skip(self))]
    async fn search_by_title(&self, term: &str, limit: usize) -> Result<Vec<Track>> {
        let query = TableQuery::from_table(TRACKS)
            .contains("title", term)
            .limit(limit);
        Ok(self.client.select(&query).await?)
    }

    #[instrument(skip(self, tracks), fields(count = tracks.len()))]
    async fn insert_many(&self, tracks: &[NewTrack]) -> Result<Vec<Track>> {
        if tracks.is_empty() {
            return Ok(Vec::new());
        }
        let inserted: Vec<Track> = self.client.insert(TRACKS, tracks).await?;
        info!(count = inserted.len(), "Tracks inserted");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn update_playtime(&self, track_id: &str, total_seconds: u64) -> Result<()> {
        self.client
            .update(
                &by_id(TRACKS, track_id),
                &json!({ "total_playtime_seconds": total_seconds }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_play_count(&self, track_id: &str, play_count: u64) -> Result<()> {
        self.client
            .update(&by_id(TRACKS, track_id), &json!({ "play_count": play_count }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::test_support::{body_json, respond, MockHttpClient};
    use bridge_traits::http::HttpMethod;
    use core_library::models::AccountType;

    const BASE: &str = "https://p.supabase.co";

    fn client(mock: MockHttpClient) -> Arc<SupabaseClient> {
        Arc::new(SupabaseClient::new(Arc::new(mock), BASE, "anon"))
    }

    const TRACK_ROW: &str = r#"{
        "id": "t1", "album_id": "al1", "title": "Intro", "track_number": 1,
        "duration_seconds": 200, "audio_url": "https://cdn/audio/tracks/1.mp3",
        "play_count": 2, "total_playtime_seconds": null
    }"#;

    #[tokio::test]
    async fn test_tracks_listed_by_track_number() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.url
                    == format!(
                        "{}/rest/v1/tracks?select=*&album_id=eq.al1&order=track_number.asc",
                        BASE
                    )
            })
            .returning(|_| Ok(respond(200, &format!("[{}]", TRACK_ROW))));

        let tracks = SupabaseTrackRepository::new(client(mock))
            .list_by_album("al1")
            .await
            .unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].total_playtime_seconds, 0);
        assert_eq!(tracks[0].play_count, 2);
    }

    #[tokio::test]
    async fn test_track_search_is_limited_substring_match() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.url == format!("{}/rest/v1/tracks?select=*&title=ilike.%25intro%25&limit=10", BASE)
            })
            .returning(|_| Ok(respond(200, "[]")));

        let tracks = SupabaseTrackRepository::new(client(mock))
            .search_by_title("intro", 10)
            .await
            .unwrap();
        assert!(tracks.is_empty());
    }

    #[tokio::test]
    async fn test_playtime_update_body() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.method == HttpMethod::Patch
                    && req.url == format!("{}/rest/v1/tracks?id=eq.t1", BASE)
                    && body_json(req) == json!({ "total_playtime_seconds": 15 })
            })
            .returning(|_| Ok(respond(204, "")));

        SupabaseTrackRepository::new(client(mock))
            .update_playtime("t1", 15)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_many_sends_one_array() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                let body = body_json(req);
                req.method == HttpMethod::Post
                    && req.url == format!("{}/rest/v1/tracks", BASE)
                    && body.as_array().map(Vec::len) == Some(2)
                    && body[1]["track_number"] == 2
                    && body[0]["duration_seconds"].is_null()
            })
            .returning(|_| Ok(respond(201, &format!("[{}]", TRACK_ROW))));

        let new_tracks = vec![
            NewTrack {
                album_id: "al1".to_string(),
                title: "Intro".to_string(),
                track_number: 1,
                audio_url: "https://cdn/audio/tracks/1.mp3".to_string(),
                duration_seconds: None,
            },
            NewTrack {
                album_id: "al1".to_string(),
                title: "Outro".to_string(),
                track_number: 2,
                audio_url: "https://cdn/audio/tracks/2.mp3".to_string(),
                duration_seconds: Some(90),
            },
        ];
        let repo = SupabaseTrackRepository::new(client(mock));
        assert_eq!(repo.insert_many(&new_tracks).await.unwrap().len(), 1);
        // Nothing to insert: no request.
        assert!(repo.insert_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_artists_owned_newest_first() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.url
                    == format!(
                        "{}/rest/v1/artists?select=*&owner_id=eq.u1&order=created_at.desc",
                        BASE
                    )
            })
            .returning(|_| {
                Ok(respond(
                    200,
                    r#"[{"id":"a1","owner_id":"u1","name":"Nina","bio":null}]"#,
                ))
            });

        let artists = SupabaseArtistRepository::new(client(mock))
            .list_by_owner("u1")
            .await
            .unwrap();
        assert_eq!(artists[0].name, "Nina");
        assert_eq!(artists[0].bio, None);
    }

    #[tokio::test]
    async fn test_artist_insert_returns_stored_row() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.headers.get("Prefer").map(String::as_str) == Some("return=representation")
                    && body_json(req)["website"].is_null()
            })
            .returning(|_| {
                Ok(respond(
                    201,
                    r#"[{"id":"a9","owner_id":"u1","name":"Nina","created_at":"2024-05-01T10:00:00+00:00"}]"#,
                ))
            });

        let artist = SupabaseArtistRepository::new(client(mock))
            .insert(&NewArtist {
                owner_id: "u1".to_string(),
                name: "Nina".to_string(),
                bio: None,
                genre: None,
                description: None,
                website: None,
                image_url: None,
            })
            .await
            .unwrap();
        assert_eq!(artist.id, "a9");
        assert!(artist.created_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_album_is_none() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| req.url == format!("{}/rest/v1/albums?select=*&id=eq.gone&limit=1", BASE))
            .returning(|_| Ok(respond(200, "[]")));

        let album = SupabaseAlbumRepository::new(client(mock))
            .find_by_id("gone")
            .await
            .unwrap();
        assert!(album.is_none());
    }

    #[tokio::test]
    async fn test_profile_upsert_merges() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                let body = body_json(req);
                req.url == format!("{}/rest/v1/user_profiles", BASE)
                    && req
                        .headers
                        .get("Prefer")
                        .is_some_and(|p| p.contains("resolution=merge-duplicates"))
                    && body["account_type"] == "artist"
                    && body.get("created_at").is_none()
            })
            .returning(|_| {
                Ok(respond(
                    201,
                    r#"[{"id":"u1","account_type":"artist","display_name":"Nina"}]"#,
                ))
            });

        let mut profile = UserProfile::new("u1", AccountType::Artist);
        profile.display_name = Some("Nina".to_string());

        let saved = SupabaseUserProfileRepository::new(client(mock))
            .upsert(&profile)
            .await
            .unwrap();
        assert!(saved.is_artist());
    }

    #[tokio::test]
    async fn test_backend_error_becomes_library_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(respond(401, r#"{"message":"JWT expired"}"#))
        });

        let err = SupabaseArtistRepository::new(client(mock))
            .delete("a1")
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Backend { status: 401, .. }));
        assert_eq!(err.to_string(), "JWT expired");
    }
}
