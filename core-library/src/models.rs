//! Domain models for the Encore catalog
//!
//! Rows map one-to-one onto the hosted tables (`user_profiles`, `artists`,
//! `albums`, `tracks`). Identifiers are the backend's string UUIDs. The
//! `New*` and `*Changes` types are the insert and update payloads; their
//! optional fields serialize as explicit `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Turn blank form input into `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

// =============================================================================
// User profiles
// =============================================================================

/// Kind of account a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    User,
    Artist,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::User => "user",
            AccountType::Artist => "artist",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Same id as the auth user.
    pub id: String,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            id: id.into(),
            account_type,
            display_name: None,
            avatar_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_artist(&self) -> bool {
        self.account_type == AccountType::Artist
    }
}

// =============================================================================
// Artists
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    /// Owning user profile.
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for `artists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewArtist {
    pub owner_id: String,
    pub name: String,
    pub bio: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
}

impl NewArtist {
    /// Validate the required name.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Artist name is required".to_string());
        }
        Ok(())
    }
}

/// Full replacement of an artist's editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistChanges {
    pub name: String,
    pub bio: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
}

// =============================================================================
// Albums
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub artist_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    /// Free-form date as stored by the backend (`YYYY-MM-DD`).
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for `albums`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAlbum {
    pub artist_id: String,
    pub title: String,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub release_date: Option<String>,
}

// =============================================================================
// Tracks
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub album_id: String,
    pub title: String,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub play_count: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_playtime_seconds: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Track {
    /// The URL to stream, if the track has a non-blank one.
    pub fn playable_url(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Insert payload for `tracks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTrack {
    pub album_id: String,
    pub title: String,
    pub track_number: u32,
    pub audio_url: String,
    pub duration_seconds: Option<u32>,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Artist page: the artist and its albums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistDetail {
    pub artist: Artist,
    pub albums: Vec<Album>,
}

/// Player page: the album (if it still exists) and its ordered tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumDetail {
    pub album: Option<Album>,
    pub tracks: Vec<Track>,
}

/// Search results, artists first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.tracks.is_empty()
    }
}
