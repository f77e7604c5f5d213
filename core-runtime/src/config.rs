//! # Core Configuration
//!
//! Validated configuration for the Encore core, assembled by the host before
//! bootstrapping the service façade.
//!
//! ## Required settings
//!
//! - **Backend URL**: base URL of the hosted backend (`http` or `https`).
//! - **Anon key**: public API key sent with every backend request.
//!
//! ## Capabilities
//!
//! - **HttpClient**: required. With the `desktop-shims` feature a
//!   `ReqwestHttpClient` is injected when none is supplied.
//! - **SecureStore**: required for session persistence. With the
//!   `desktop-shims` feature a `KeyringSecureStore` is injected when none is
//!   supplied.
//! - **Clock**: optional, defaults to the system clock.
//!
//! ## Example
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .backend_url("https://project.supabase.co")
//!     .anon_key("public-anon-key")
//!     .http_client(http)
//!     .secure_store(store)
//!     .build()?;
//! ```
//!
//! Hosts that read settings from the process environment can start from
//! [`CoreConfigBuilder::from_env`] instead.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, HttpClient, SecureStore, SystemClock};
use std::sync::Arc;
use url::Url;

/// Environment variable holding the backend base URL.
pub const ENV_BACKEND_URL: &str = "ENCORE_BACKEND_URL";
/// Environment variable holding the backend anon key.
pub const ENV_BACKEND_ANON_KEY: &str = "ENCORE_BACKEND_ANON_KEY";

/// Hosted backend coordinates.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL without a trailing slash.
    pub url: String,
    /// Public anon key.
    pub anon_key: String,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// Behaviour switches for the playback coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Increment a track's play count every time it starts.
    pub count_plays: bool,
    /// Start the next queued track when one finishes.
    pub auto_advance: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            count_plays: true,
            auto_advance: true,
        }
    }
}

/// Limits applied by catalog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Queries shorter than this return nothing.
    pub min_query_chars: usize,
    /// Maximum rows per result kind.
    pub result_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_query_chars: 2,
            result_limit: 10,
        }
    }
}

/// Core configuration with injected host capabilities.
#[derive(Clone)]
pub struct CoreConfig {
    pub backend: BackendConfig,
    pub http_client: Arc<dyn HttpClient>,
    pub secure_store: Arc<dyn SecureStore>,
    pub clock: Arc<dyn Clock>,
    /// Capacity of the broadcast channel behind the event bus.
    pub event_buffer_size: usize,
    pub playback: PlaybackSettings,
    pub search: SearchSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("backend", &self.backend)
            .field("http_client", &"HttpClient { ... }")
            .field("secure_store", &"SecureStore { ... }")
            .field("clock", &"Clock { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .field("playback", &self.playback)
            .field("search", &self.search)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Build a configuration from `ENCORE_BACKEND_URL` and
    /// `ENCORE_BACKEND_ANON_KEY`, with default capabilities.
    pub fn from_env() -> Result<Self> {
        CoreConfigBuilder::from_env()?.build()
    }

    /// Re-check invariants. `build` calls this already.
    pub fn validate(&self) -> Result<()> {
        validate_backend_url(&self.backend.url)?;

        if self.backend.anon_key.trim().is_empty() {
            return Err(Error::Config("Backend anon key cannot be empty".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.search.min_query_chars == 0 {
            return Err(Error::Config(
                "Search minimum query length must be at least 1".to_string(),
            ));
        }

        if self.search.result_limit == 0 {
            return Err(Error::Config(
                "Search result limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_backend_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::Config(format!("Invalid backend URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "Backend URL must use http or https, got '{}'",
            other
        ))),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the backend. \
                 Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                 Mobile: inject the platform networking stack."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::KeyringSecureStore;

    let store: Arc<dyn SecureStore> = Arc::new(KeyringSecureStore::new());
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(Error::CapabilityMissing {
        capability: "SecureStore".to_string(),
        message: "SecureStore implementation is required for session persistence. \
                 Desktop: enable the 'desktop-shims' feature to use KeyringSecureStore. \
                 Mobile: inject Keychain/Keystore-backed storage."
            .to_string(),
    })
}

#[derive(Default)]
pub struct CoreConfigBuilder {
    backend_url: Option<String>,
    anon_key: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    clock: Option<Arc<dyn Clock>>,
    event_buffer_size: Option<usize>,
    playback: PlaybackSettings,
    search: SearchSettings,
}

impl CoreConfigBuilder {
    /// Seed a builder from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Seed a builder from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup(ENV_BACKEND_URL)
            .ok_or_else(|| Error::Config(format!("{} is not set", ENV_BACKEND_URL)))?;
        let anon_key = lookup(ENV_BACKEND_ANON_KEY)
            .ok_or_else(|| Error::Config(format!("{} is not set", ENV_BACKEND_ANON_KEY)))?;

        Ok(Self::default().backend_url(backend_url).anon_key(anon_key))
    }

    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    pub fn anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn playback(mut self, settings: PlaybackSettings) -> Self {
        self.playback = settings;
        self
    }

    pub fn count_plays(mut self, enabled: bool) -> Self {
        self.playback.count_plays = enabled;
        self
    }

    pub fn auto_advance(mut self, enabled: bool) -> Self {
        self.playback.auto_advance = enabled;
        self
    }

    pub fn search(mut self, settings: SearchSettings) -> Self {
        self.search = settings;
        self
    }

    /// Validate and assemble the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when the backend URL or anon key is missing or
    ///   malformed, or a numeric setting is zero.
    /// - [`Error::CapabilityMissing`] when a required capability was not
    ///   injected and no desktop default is compiled in.
    pub fn build(self) -> Result<CoreConfig> {
        let backend_url = self.backend_url.ok_or_else(|| {
            Error::Config("Backend URL is required. Use .backend_url() to set it.".to_string())
        })?;
        let anon_key = self.anon_key.ok_or_else(|| {
            Error::Config("Backend anon key is required. Use .anon_key() to set it.".to_string())
        })?;

        validate_backend_url(&backend_url)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };

        let config = CoreConfig {
            backend: BackendConfig {
                url: backend_url.trim_end_matches('/').to_string(),
                anon_key,
            },
            http_client,
            secure_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            playback: self.playback,
            search: self.search,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::MemorySecureStore;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use std::collections::HashMap;

    struct NoopHttpClient;

    #[async_trait::async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse {
                status: 204,
                headers: HashMap::new(),
                body: Default::default(),
            })
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .backend_url("https://encore.supabase.co/")
            .anon_key("anon")
            .http_client(Arc::new(NoopHttpClient))
            .secure_store(Arc::new(MemorySecureStore::new()))
    }

    #[test]
    fn test_builder_with_all_capabilities() {
        let config = builder().build().unwrap();

        assert_eq!(config.backend.url, "https://encore.supabase.co");
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.playback, PlaybackSettings::default());
        assert_eq!(config.search.min_query_chars, 2);
        assert_eq!(config.search.result_limit, 10);
    }

    #[test]
    fn test_missing_backend_url() {
        let result = CoreConfig::builder().anon_key("anon").build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Backend URL")));
    }

    #[test]
    fn test_rejects_non_http_backend() {
        let result = builder().backend_url("ftp://encore.example.com").build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("http or https")));

        let result = builder().backend_url("not a url").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_blank_anon_key() {
        let result = builder().anon_key("  ").build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("anon key")));
    }

    #[test]
    fn test_rejects_zero_limits() {
        assert!(builder().event_buffer_size(0).build().is_err());
        assert!(builder()
            .search(SearchSettings {
                min_query_chars: 2,
                result_limit: 0,
            })
            .build()
            .is_err());
    }

    #[test]
    fn test_playback_switches() {
        let config = builder().count_plays(false).auto_advance(false).build().unwrap();
        assert!(!config.playback.count_plays);
        assert!(!config.playback.auto_advance);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://localhost:54321"),
            (ENV_BACKEND_ANON_KEY, "local-anon"),
        ]
        .into_iter()
        .collect();

        let config = CoreConfigBuilder::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap()
            .http_client(Arc::new(NoopHttpClient))
            .secure_store(Arc::new(MemorySecureStore::new()))
            .build()
            .unwrap();

        assert_eq!(config.backend.url, "http://localhost:54321");
        assert_eq!(config.backend.anon_key, "local-anon");
    }

    #[test]
    fn test_from_lookup_missing_key() {
        let result = CoreConfigBuilder::from_lookup(|k| {
            (k == ENV_BACKEND_URL).then(|| "https://x.supabase.co".to_string())
        });
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(ENV_BACKEND_ANON_KEY)));
    }

    #[test]
    fn test_debug_redacts_anon_key() {
        let config = builder().anon_key("super-secret").build().unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_without_shims() {
        let result = CoreConfig::builder()
            .backend_url("https://encore.supabase.co")
            .anon_key("anon")
            .secure_store(Arc::new(MemorySecureStore::new()))
            .build();
        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { capability, .. }) if capability == "HttpClient"
        ));
    }
}
