//! Error types for the Supabase provider

use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use core_library::LibraryError;
use thiserror::Error;

/// Supabase provider errors
#[derive(Error, Debug)]
pub enum SupabaseError {
    /// Non-2xx response. `message` is the backend's own text.
    #[error("Supabase API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// Transport failure
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for Supabase operations
pub type Result<T> = std::result::Result<T, SupabaseError>;

impl SupabaseError {
    /// Build an API error from a failed response body.
    ///
    /// PostgREST, GoTrue and Storage each name the human-readable field
    /// differently; the first one present wins, then the raw body.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "msg", "error_description", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            })
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| format!("HTTP {}", status));

        SupabaseError::Api { status, message }
    }
}

impl From<SupabaseError> for LibraryError {
    fn from(error: SupabaseError) -> Self {
        match error {
            SupabaseError::Api { status, message } => LibraryError::Backend { status, message },
            SupabaseError::Parse(msg) => LibraryError::Serialization(msg),
            SupabaseError::Bridge(e) => LibraryError::Bridge(e),
        }
    }
}

impl From<SupabaseError> for AuthError {
    fn from(error: SupabaseError) -> Self {
        match error {
            SupabaseError::Api { message, .. } => AuthError::AuthenticationFailed(message),
            SupabaseError::Parse(msg) => AuthError::Serialization(msg),
            SupabaseError::Bridge(e) => AuthError::Network(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(error: SupabaseError) -> String {
        match error {
            SupabaseError::Api { message, .. } => message,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_message_extraction() {
        assert_eq!(
            message(SupabaseError::from_response(
                400,
                br#"{"code":"23505","message":"duplicate key value","details":null}"#
            )),
            "duplicate key value"
        );
        assert_eq!(
            message(SupabaseError::from_response(
                400,
                br#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            )),
            "Invalid login credentials"
        );
        assert_eq!(
            message(SupabaseError::from_response(502, b"Bad Gateway")),
            "Bad Gateway"
        );
        assert_eq!(message(SupabaseError::from_response(500, b"")), "HTTP 500");
    }

    #[test]
    fn test_library_error_keeps_backend_message() {
        let error: LibraryError = SupabaseError::Api {
            status: 409,
            message: "duplicate key value".to_string(),
        }
        .into();

        assert_eq!(error.to_string(), "duplicate key value");
        assert!(matches!(error, LibraryError::Backend { status: 409, .. }));
    }

    #[test]
    fn test_auth_error_conversion() {
        let error: AuthError = SupabaseError::Bridge(BridgeError::OperationFailed(
            "connection refused".to_string(),
        ))
        .into();
        assert!(matches!(error, AuthError::Network(_)));
    }
}
