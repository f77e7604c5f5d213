use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    /// Catalog reads and writes. Backend rejections display their raw text.
    #[error(transparent)]
    Library(#[from] core_library::LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    /// A picked file or remote asset could not be read before upload.
    #[error("Asset unavailable: {name} - {message}")]
    AssetUnavailable { name: String, message: String },
}

impl From<provider_supabase::SupabaseError> for CoreError {
    fn from(e: provider_supabase::SupabaseError) -> Self {
        CoreError::Library(e.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
