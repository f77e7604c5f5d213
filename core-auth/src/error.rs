use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{field}: {message}")]
    InvalidInput { field: String, message: String },

    /// Rejected by the backend; the message is the backend's own.
    #[error("{0}")]
    AuthenticationFailed(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Stored session is corrupted: {0}")]
    SessionCorrupted(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Library(#[from] LibraryError),
}

impl AuthError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AuthError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
