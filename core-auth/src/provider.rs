use crate::error::Result;
use crate::types::{AuthSession, SignUpOutcome, SignUpRequest};
use async_trait::async_trait;

/// Account operations offered by the hosted backend.
///
/// Implementations also hold the bearer token used for data access, which
/// [`AuthManager`](crate::AuthManager) updates through
/// [`set_access_token`](AuthProvider::set_access_token) whenever the session
/// changes.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession>;

    /// Revoke the session remotely.
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Authorize subsequent backend calls, or fall back to anonymous access.
    fn set_access_token(&self, access_token: Option<String>);
}
