//! Core service façade and bootstrap helpers.
//!
//! This crate wires the validated [`CoreConfig`] and a host-provided audio
//! adapter into the shared Rust core: the hosted backend provider, the
//! authentication manager, the catalog and publishing services, and the
//! playback coordinator. Desktop apps typically enable the `desktop-shims`
//! feature so the HTTP client and secure store come from `bridge-desktop`.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::CoreService;
//!
//! let config = CoreConfig::from_env()?;
//! let core = CoreService::bootstrap(config, audio_adapter)?;
//! core.auth().restore_session().await?;
//! let artists = core.catalog().list_artists().await?;
//! ```

pub mod assets;
pub mod catalog;
pub mod error;
pub mod publishing;

pub use assets::AssetSource;
pub use catalog::CatalogService;
pub use error::{CoreError, Result};
pub use publishing::{AlbumForm, ArtistForm, PublishingService, TrackForm};

use std::sync::Arc;

use bridge_traits::playback::PlaybackAdapter;
use core_auth::AuthManager;
use core_library::models::{AlbumDetail, Artist};
use core_library::storage::AssetUploader;
use core_playback::PlaybackCoordinator;
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use provider_supabase::{
    SupabaseAlbumRepository, SupabaseArtistRepository, SupabaseAuth, SupabaseClient,
    SupabaseStorage, SupabaseTrackRepository, SupabaseUserProfileRepository,
};
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    event_bus: EventBus,
    auth: Arc<AuthManager>,
    catalog: CatalogService,
    publishing: PublishingService,
    playback: PlaybackCoordinator,
}

impl CoreService {
    /// Build every component against the hosted backend.
    ///
    /// Must be called from within a Tokio runtime: the playback coordinator
    /// spawns its controller task here.
    pub fn bootstrap(config: CoreConfig, audio: Arc<dyn PlaybackAdapter>) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let client = Arc::new(SupabaseClient::from_config(
            config.http_client.clone(),
            &config.backend,
        ));

        let profiles = Arc::new(SupabaseUserProfileRepository::new(client.clone()));
        let artists = Arc::new(SupabaseArtistRepository::new(client.clone()));
        let albums = Arc::new(SupabaseAlbumRepository::new(client.clone()));
        let tracks = Arc::new(SupabaseTrackRepository::new(client.clone()));
        let uploader = AssetUploader::new(
            Arc::new(SupabaseStorage::new(client.clone())),
            config.clock.clone(),
        );

        let auth = Arc::new(AuthManager::new(
            Arc::new(SupabaseAuth::new(client.clone(), config.clock.clone())),
            profiles,
            config.secure_store.clone(),
            event_bus.clone(),
            config.clock.clone(),
        ));

        let catalog = CatalogService::new(
            artists.clone(),
            albums.clone(),
            tracks.clone(),
            config.search,
        );
        let publishing = PublishingService::new(
            artists,
            albums,
            tracks.clone(),
            uploader,
            config.http_client.clone(),
            event_bus.clone(),
        );
        let playback = PlaybackCoordinator::spawn(
            audio,
            tracks,
            config.clock.clone(),
            event_bus.clone(),
            config.playback,
        );

        info!(backend = %client.base_url(), "Core service ready");

        Ok(Self {
            config: Arc::new(config),
            event_bus,
            auth,
            catalog,
            publishing,
            playback,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn publishing(&self) -> &PublishingService {
        &self.publishing
    }

    pub fn playback(&self) -> &PlaybackCoordinator {
        &self.playback
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// New stream of every core event from now on.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    /// Artists owned by the signed-in user.
    pub async fn my_artists(&self) -> Result<Vec<Artist>> {
        let user_id = self.auth.require_user_id().await?;
        self.catalog.artists_owned_by(&user_id).await
    }

    /// Create an artist owned by the signed-in user.
    pub async fn create_my_artist(&self, form: ArtistForm) -> Result<Artist> {
        let user_id = self.auth.require_user_id().await?;
        self.publishing.create_artist(&user_id, form).await
    }

    /// Load an album and start playing it from `start_index`.
    pub async fn play_album(&self, album_id: &str, start_index: usize) -> Result<bool> {
        let AlbumDetail { album, tracks } = self.catalog.album_detail(album_id).await?;
        let Some(album) = album else {
            return Ok(false);
        };
        let outcome = self.playback.play_album(album, tracks, start_index).await?;
        Ok(outcome.is_started())
    }

    /// Stop playback and flush pending playtime writes.
    pub async fn shutdown(&self) {
        if let Err(e) = self.playback.stop_playback().await {
            tracing::debug!(error = %e, "Playback already stopped");
        }
        self.playback.flush_stats().await;
    }
}
