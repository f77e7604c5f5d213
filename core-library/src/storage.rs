//! Hosted object storage for artwork and audio.
//!
//! Objects live in two public buckets:
//!
//! | Bucket   | Folders                 | Default extension |
//! |----------|-------------------------|-------------------|
//! | `images` | `artists/`, `albums/`   | `jpg`             |
//! | `audio`  | `tracks/`               | `mp3`             |
//!
//! Uploaded objects are named `<folder>/<unix-millis>-<random base36>.<ext>`
//! and never overwrite an existing object. Callers keep only the public URL;
//! deletion recovers the object path from that URL.

use crate::error::{LibraryError, Result};
use async_trait::async_trait;
use bridge_traits::time::Clock;
use bytes::Bytes;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

const SUFFIX_LEN: usize = 11;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Public storage bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Images,
    Audio,
}

impl Bucket {
    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Images => "images",
            Bucket::Audio => "audio",
        }
    }

    fn media_type(&self) -> &'static str {
        match self {
            Bucket::Images => "image",
            Bucket::Audio => "audio",
        }
    }

    fn default_extension(&self) -> &'static str {
        match self {
            Bucket::Images => "jpg",
            Bucket::Audio => "mp3",
        }
    }

    /// MIME type derived from a file extension, e.g. `image/png`.
    pub fn content_type(&self, extension: &str) -> String {
        format!("{}/{}", self.media_type(), extension)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Folder an upload lands in. Each folder belongs to one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFolder {
    ArtistImages,
    AlbumCovers,
    TrackAudio,
}

impl AssetFolder {
    pub fn bucket(&self) -> Bucket {
        match self {
            AssetFolder::ArtistImages | AssetFolder::AlbumCovers => Bucket::Images,
            AssetFolder::TrackAudio => Bucket::Audio,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            AssetFolder::ArtistImages => "artists",
            AssetFolder::AlbumCovers => "albums",
            AssetFolder::TrackAudio => "tracks",
        }
    }
}

/// Extension of a source name: the text after the last `.`, with any query
/// string removed. Falls back to `default` when there is none.
pub fn extension_of(source_name: &str, default: &str) -> String {
    let without_query = source_name.split(['?', '#']).next().unwrap_or_default();

    match without_query.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains(['/', '\\']) => ext.to_string(),
        _ => default.to_string(),
    }
}

fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Storage path and content type for a new upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    pub bucket: Bucket,
    pub path: String,
    pub content_type: String,
}

impl ObjectName {
    /// Derive a collision-resistant object name.
    pub fn generate<R: Rng + ?Sized>(
        folder: AssetFolder,
        source_name: &str,
        unix_millis: i64,
        rng: &mut R,
    ) -> Self {
        let bucket = folder.bucket();
        let extension = extension_of(source_name, bucket.default_extension());
        let path = format!(
            "{}/{}-{}.{}",
            folder.prefix(),
            unix_millis,
            random_suffix(rng),
            extension
        );

        Self {
            bucket,
            content_type: bucket.content_type(&extension),
            path,
        }
    }
}

/// Recover the object path from a public URL.
///
/// Returns `Ok(None)` for an empty URL. The path is everything after the last
/// `/<bucket>/` segment.
pub fn object_path_from_url(bucket: Bucket, url: &str) -> Result<Option<String>> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(None);
    }

    let marker = format!("/{}/", bucket.name());
    match url.rsplit_once(&marker) {
        Some((_, path)) if !path.is_empty() => {
            let path = path.split(['?', '#']).next().unwrap_or_default();
            Ok(Some(path.to_string()))
        }
        _ => Err(LibraryError::invalid(
            "url",
            format!("Invalid {} URL: {}", bucket.media_type(), url),
        )),
    }
}

/// Bucket-scoped object storage offered by the backend.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Store `data` at `path` without overwriting. Returns the stored path.
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String>;

    /// Remove objects by path.
    async fn remove(&self, bucket: Bucket, paths: &[String]) -> Result<()>;

    /// Public URL of a stored object.
    fn public_url(&self, bucket: Bucket, path: &str) -> String;
}

/// Upload/delete helper that names objects and resolves public URLs.
#[derive(Clone)]
pub struct AssetUploader {
    storage: Arc<dyn AssetStorage>,
    clock: Arc<dyn Clock>,
}

impl AssetUploader {
    pub fn new(storage: Arc<dyn AssetStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Upload `data` into `folder` and return its public URL.
    ///
    /// `source_name` is only used for the extension.
    pub async fn upload(
        &self,
        folder: AssetFolder,
        source_name: &str,
        data: Bytes,
    ) -> Result<String> {
        let name = ObjectName::generate(
            folder,
            source_name,
            self.clock.unix_timestamp_millis(),
            &mut rand::thread_rng(),
        );

        debug!(
            bucket = %name.bucket,
            path = %name.path,
            bytes = data.len(),
            "Uploading asset"
        );

        let stored = self
            .storage
            .upload(name.bucket, &name.path, &name.content_type, data)
            .await?;
        let url = self.storage.public_url(name.bucket, &stored);

        info!(bucket = %name.bucket, path = %stored, "Asset uploaded");
        Ok(url)
    }

    /// Delete the object behind a public URL. Empty URLs are ignored.
    pub async fn delete_by_url(&self, bucket: Bucket, url: &str) -> Result<()> {
        let Some(path) = object_path_from_url(bucket, url)? else {
            return Ok(());
        };

        self.storage.remove(bucket, &[path.clone()]).await?;
        info!(bucket = %bucket, path = %path, "Asset deleted");
        Ok(())
    }
}
