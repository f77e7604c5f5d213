//! Picked assets waiting to be uploaded.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Where the bytes of an image or audio file come from.
///
/// The name of the source (file name, path or URL) decides the stored
/// object's extension and content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// File on the local filesystem.
    File(PathBuf),
    /// Bytes already in memory, e.g. handed over by a platform picker.
    Memory { file_name: String, data: Bytes },
    /// Remote resource fetched with the host HTTP client.
    Remote(String),
}

impl AssetSource {
    pub fn memory(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::Memory {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            AssetSource::File(path) => path.to_string_lossy().into_owned(),
            AssetSource::Memory { file_name, .. } => file_name.clone(),
            AssetSource::Remote(url) => url.clone(),
        }
    }

    pub(crate) async fn read(&self, http: &dyn HttpClient) -> Result<Bytes> {
        match self {
            AssetSource::File(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| self.unavailable(e.to_string())),
            AssetSource::Memory { data, .. } => Ok(data.clone()),
            AssetSource::Remote(url) => {
                let response = http
                    .execute(HttpRequest::new(HttpMethod::Get, url.clone()))
                    .await
                    .map_err(|e| self.unavailable(e.to_string()))?;
                if !response.is_success() {
                    return Err(self.unavailable(format!("HTTP {}", response.status)));
                }
                Ok(response.body)
            }
        }
    }

    fn unavailable(&self, message: String) -> CoreError {
        CoreError::AssetUnavailable {
            name: self.name(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &'static [u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from_static(body),
        }
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = AssetSource::memory("cover.png", Bytes::from_static(b"PNG"));
        let data = source.read(&MockHttp::new()).await.unwrap();
        assert_eq!(&data[..], b"PNG");
        assert_eq!(source.name(), "cover.png");
    }

    #[tokio::test]
    async fn test_remote_source() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.method == HttpMethod::Get && req.url == "https://cdn/take.wav")
            .times(1)
            .returning(|_| Ok(response(200, b"RIFF")));

        let source = AssetSource::Remote("https://cdn/take.wav".to_string());
        assert_eq!(&source.read(&http).await.unwrap()[..], b"RIFF");
    }

    #[tokio::test]
    async fn test_remote_failure_names_source() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .returning(|_| Ok(response(404, b"")));

        let source = AssetSource::Remote("https://cdn/gone.mp3".to_string());
        match source.read(&http).await {
            Err(CoreError::AssetUnavailable { name, message }) => {
                assert_eq!(name, "https://cdn/gone.mp3");
                assert_eq!(message, "HTTP 404");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = AssetSource::File(PathBuf::from("/definitely/not/here.jpg"));
        assert!(matches!(
            source.read(&MockHttp::new()).await,
            Err(CoreError::AssetUnavailable { .. })
        ));
    }
}
