//! Supabase Storage implementation of [`AssetStorage`].

use async_trait::async_trait;
use bridge_traits::http::HttpMethod;
use bytes::Bytes;
use core_library::error::Result;
use core_library::storage::{AssetStorage, Bucket};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::connector::SupabaseClient;
use crate::types::RemoveObjects;

/// Browser/CDN cache lifetime for uploaded objects, in seconds.
const CACHE_CONTROL_SECS: u32 = 3600;

pub struct SupabaseStorage {
    client: Arc<SupabaseClient>,
}

impl SupabaseStorage {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetStorage for SupabaseStorage {
    #[instrument(skip(self, data), fields(bucket = %bucket, bytes = data.len()))]
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String> {
        let url = self
            .client
            .storage_url(&format!("object/{}/{}", bucket.name(), path));
        let request = self
            .client
            .request(HttpMethod::Post, url)
            .header("Content-Type", content_type)
            .header("cache-control", format!("max-age={}", CACHE_CONTROL_SECS))
            .header("x-upsert", "false")
            .body(data);

        self.client.send(request).await?;
        info!("Object uploaded");
        Ok(path.to_string())
    }

    #[instrument(skip(self), fields(bucket = %bucket))]
    async fn remove(&self, bucket: Bucket, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let url = self
            .client
            .storage_url(&format!("object/{}", bucket.name()));
        let request = self
            .client
            .request(HttpMethod::Delete, url)
            .json(&RemoveObjects { prefixes: paths })?;

        self.client.send(request).await?;
        info!(count = paths.len(), "Objects removed");
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        self.client
            .storage_url(&format!("object/public/{}/{}", bucket.name(), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::test_support::{body_json, respond, MockHttpClient};
    use core_library::LibraryError;
    use serde_json::json;

    fn storage(mock: MockHttpClient) -> SupabaseStorage {
        SupabaseStorage::new(Arc::new(SupabaseClient::new(
            Arc::new(mock),
            "https://p.supabase.co",
            "anon",
        )))
    }

    #[tokio::test]
    async fn test_upload_request() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.method == HttpMethod::Post
                    && req.url
                        == "https://p.supabase.co/storage/v1/object/audio/tracks/1-abc.mp3"
                    && req.headers.get("Content-Type").map(String::as_str) == Some("audio/mp3")
                    && req.headers.get("x-upsert").map(String::as_str) == Some("false")
                    && req.headers.get("cache-control").map(String::as_str)
                        == Some("max-age=3600")
                    && req.body.as_deref() == Some(&b"ID3"[..])
            })
            .returning(|_| Ok(respond(200, r#"{"Key":"audio/tracks/1-abc.mp3"}"#)));

        let path = storage(mock)
            .upload(
                Bucket::Audio,
                "tracks/1-abc.mp3",
                "audio/mp3",
                Bytes::from_static(b"ID3"),
            )
            .await
            .unwrap();
        assert_eq!(path, "tracks/1-abc.mp3");
    }

    #[tokio::test]
    async fn test_upload_conflict_is_reported() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(respond(
                400,
                r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#,
            ))
        });

        let err = storage(mock)
            .upload(Bucket::Images, "albums/1.jpg", "image/jpg", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Backend { .. }));
        assert_eq!(err.to_string(), "The resource already exists");
    }

    #[tokio::test]
    async fn test_remove_request() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.method == HttpMethod::Delete
                    && req.url == "https://p.supabase.co/storage/v1/object/images"
                    && body_json(req) == json!({ "prefixes": ["artists/1-x.jpg"] })
            })
            .returning(|_| Ok(respond(200, "[]")));

        storage(mock)
            .remove(Bucket::Images, &["artists/1-x.jpg".to_string()])
            .await
            .unwrap();
    }

    #[test]
    fn test_public_url() {
        let storage = storage(MockHttpClient::new());
        assert_eq!(
            storage.public_url(Bucket::Images, "albums/1-x.png"),
            "https://p.supabase.co/storage/v1/object/public/images/albums/1-x.png"
        );
    }
}
