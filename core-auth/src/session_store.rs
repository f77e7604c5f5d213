//! Session persistence
//!
//! The signed-in session is kept as JSON under a single key in the host's
//! `SecureStore` (Keychain, Credential Manager, Secret Service, ...).
//! Token values are never logged.

use crate::error::{AuthError, Result};
use crate::types::AuthSession;
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Secure-store key holding the serialized session.
pub const SESSION_KEY: &str = "encore.auth.session";

#[derive(Clone)]
pub struct SessionStore {
    secure_store: Arc<dyn SecureStore>,
}

impl SessionStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        debug!("Initializing SessionStore");
        Self { secure_store }
    }

    pub async fn save(&self, session: &AuthSession) -> Result<()> {
        let json = serde_json::to_vec(session).map_err(|e| {
            warn!(error = %e, "Failed to serialize session");
            AuthError::Serialization(e.to_string())
        })?;

        self.secure_store
            .set_secret(SESSION_KEY, &json)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to store session in secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(
            user_id = %session.user_id(),
            expires_at = %session.expires_at,
            "Session stored securely"
        );
        Ok(())
    }

    /// Load the stored session.
    ///
    /// Unreadable data is deleted and reported as
    /// [`AuthError::SessionCorrupted`].
    pub async fn load(&self) -> Result<Option<AuthSession>> {
        let data = self.secure_store.get_secret(SESSION_KEY).await.map_err(|e| {
            warn!(error = %e, "Failed to read session from secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!("No stored session");
            return Ok(None);
        };

        match serde_json::from_slice::<AuthSession>(&data) {
            Ok(session) => {
                debug!(user_id = %session.user_id(), "Stored session loaded");
                Ok(Some(session))
            }
            Err(e) => {
                warn!(error = %e, "Stored session is unreadable, discarding it");

                if let Err(delete_err) = self.secure_store.delete_secret(SESSION_KEY).await {
                    warn!(error = %delete_err, "Failed to delete corrupted session");
                }

                Err(AuthError::SessionCorrupted(e.to_string()))
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.secure_store
            .delete_secret(SESSION_KEY)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete session from secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!("Stored session cleared");
        Ok(())
    }
}
