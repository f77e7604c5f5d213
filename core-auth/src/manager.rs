//! Authentication Manager
//!
//! Coordinates the account lifecycle:
//! - Sign-up: account creation plus the `user_profiles` row
//! - Sign-in: session persisted, profile loaded, data access authorized
//! - Sign-out: best-effort remote revocation, local state always cleared
//! - Restore: stored session reloaded at startup, refreshed when close to
//!   expiry
//!
//! All state changes are published on the [`EventBus`].

use crate::error::{AuthError, Result};
use crate::provider::AuthProvider;
use crate::session_store::SessionStore;
use crate::types::{AuthSession, AuthState, SignUpRequest};
use bridge_traits::storage::SecureStore;
use bridge_traits::time::Clock;
use core_library::models::UserProfile;
use core_library::repositories::UserProfileRepository;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Sessions expiring within this window are refreshed on restore.
const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Default)]
struct SignedInState {
    session: Option<AuthSession>,
    profile: Option<UserProfile>,
}

pub struct AuthManager {
    provider: Arc<dyn AuthProvider>,
    profiles: Arc<dyn UserProfileRepository>,
    session_store: SessionStore,
    event_bus: EventBus,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<SignedInState>>,
    /// Serializes session-changing operations.
    transition: Mutex<()>,
}

impl AuthManager {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        profiles: Arc<dyn UserProfileRepository>,
        secure_store: Arc<dyn SecureStore>,
        event_bus: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            profiles,
            session_store: SessionStore::new(secure_store),
            event_bus,
            clock,
            state: Arc::new(RwLock::new(SignedInState::default())),
            transition: Mutex::new(()),
        }
    }

    /// Create an account and its profile row.
    ///
    /// When the backend hands back a session right away the user is signed
    /// in as well. Returns the stored profile.
    #[instrument(skip(self, request), fields(email = %request.email, account_type = %request.account_type))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<UserProfile> {
        validate_credentials(&request.email, &request.password)?;
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::invalid(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        let display_name = request.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AuthError::invalid("display_name", "Display name is required"));
        }

        let _guard = self.transition.lock().await;
        info!("Creating account");

        let outcome = self
            .provider
            .sign_up(&request)
            .await
            .map_err(|e| self.report_failure("Sign-up failed", e))?;

        if let Some(session) = &outcome.session {
            self.provider
                .set_access_token(Some(session.access_token.clone()));
        }

        let mut profile = UserProfile::new(outcome.user.id.clone(), request.account_type);
        profile.display_name = Some(display_name);

        let profile = self
            .profiles
            .upsert(&profile)
            .await
            .map_err(|e| self.report_failure("Profile creation failed", e.into()))?;

        self.event_bus.publish(CoreEvent::Auth(AuthEvent::SignedUp {
            user_id: outcome.user.id.clone(),
            account_type: request.account_type.to_string(),
        }));

        match outcome.session {
            Some(session) => {
                self.session_store.save(&session).await?;
                self.install(session, Some(profile.clone())).await;
                info!("Account created and signed in");
            }
            None => {
                self.provider.set_access_token(None);
                info!("Account created, awaiting confirmation before sign-in");
            }
        }

        Ok(profile)
    }

    /// Sign in with email and password.
    ///
    /// Returns the user's profile, or `None` if the account has no profile
    /// row yet.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Option<UserProfile>> {
        validate_credentials(email, password)?;

        let _guard = self.transition.lock().await;
        info!("Signing in");

        let session = self
            .provider
            .sign_in_with_password(email.trim(), password)
            .await
            .map_err(|e| self.report_failure("Sign-in failed", e))?;

        self.session_store.save(&session).await?;
        self.provider
            .set_access_token(Some(session.access_token.clone()));

        let user_id = session.user_id().to_string();
        let profile = self.load_profile(&user_id).await;
        self.install(session, profile.clone()).await;

        self.event_bus.publish(CoreEvent::Auth(AuthEvent::SignedIn { user_id }));

        info!("Sign-in completed successfully");
        Ok(profile)
    }

    /// Sign out. Remote revocation is best-effort; local state is always
    /// cleared.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.transition.lock().await;

        let session = {
            let mut state = self.state.write().await;
            state.profile = None;
            state.session.take()
        };

        if let Some(session) = &session {
            if let Err(e) = self.provider.sign_out(&session.access_token).await {
                warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
            }
        }

        self.provider.set_access_token(None);
        if let Err(e) = self.session_store.clear().await {
            warn!(error = %e, "Failed to clear stored session");
        }

        self.event_bus.publish(CoreEvent::Auth(AuthEvent::SignedOut {
            user_id: session.map(|s| s.user.id),
        }));

        info!("Sign-out completed");
        Ok(())
    }

    /// Restore the stored session, refreshing it if it expires within five
    /// minutes.
    ///
    /// Returns `Ok(None)` when there is nothing usable to restore. A session
    /// that can no longer be refreshed is discarded.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> Result<Option<UserProfile>> {
        let _guard = self.transition.lock().await;

        let stored = match self.session_store.load().await {
            Ok(stored) => stored,
            Err(AuthError::SessionCorrupted(reason)) => {
                warn!(%reason, "Ignoring corrupted session");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(mut session) = stored else {
            debug!("No session to restore");
            return Ok(None);
        };

        let refreshed = session.expires_within(
            self.clock.now(),
            chrono::Duration::seconds(TOKEN_REFRESH_BUFFER_SECS),
        );
        if refreshed {
            info!(user_id = %session.user_id(), "Stored session expiring, refreshing");

            session = match self.provider.refresh_session(&session.refresh_token).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    error!(error = %e, "Session refresh failed, discarding stored session");
                    self.event_bus.publish(CoreEvent::Auth(AuthEvent::AuthError {
                        message: format!("Session refresh failed: {}", e),
                        recoverable: false,
                    }));
                    if let Err(clear_err) = self.session_store.clear().await {
                        warn!(error = %clear_err, "Failed to clear stale session");
                    }
                    return Ok(None);
                }
            };

            self.session_store.save(&session).await?;
        }

        self.provider
            .set_access_token(Some(session.access_token.clone()));

        let user_id = session.user_id().to_string();
        let profile = self.load_profile(&user_id).await;
        self.install(session, profile.clone()).await;

        self.event_bus.publish(CoreEvent::Auth(AuthEvent::SessionRestored { user_id, refreshed }));

        info!(refreshed, "Session restored");
        Ok(profile)
    }

    pub async fn current_session(&self) -> Option<AuthSession> {
        self.state.read().await.session.clone()
    }

    pub async fn current_profile(&self) -> Option<UserProfile> {
        self.state.read().await.profile.clone()
    }

    pub async fn is_artist(&self) -> bool {
        self.state
            .read()
            .await
            .profile
            .as_ref()
            .is_some_and(UserProfile::is_artist)
    }

    pub async fn state(&self) -> AuthState {
        if self.state.read().await.session.is_some() {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        }
    }

    /// The signed-in user's id, or [`AuthError::NotAuthenticated`].
    pub async fn require_user_id(&self) -> Result<String> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user.id.clone())
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn install(&self, session: AuthSession, profile: Option<UserProfile>) {
        let mut state = self.state.write().await;
        state.session = Some(session);
        state.profile = profile;
    }

    /// A missing or unreadable profile does not fail the sign-in.
    async fn load_profile(&self, user_id: &str) -> Option<UserProfile> {
        match self.profiles.find_by_id(user_id).await {
            Ok(profile) => {
                if profile.is_none() {
                    warn!(%user_id, "Signed-in user has no profile row");
                }
                profile
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Failed to load profile");
                None
            }
        }
    }

    fn report_failure(&self, context: &str, e: AuthError) -> AuthError {
        error!(error = %e, "{}", context);
        let recoverable = matches!(e, AuthError::Network(_));
        self.event_bus.publish(CoreEvent::Auth(AuthEvent::AuthError {
            message: e.to_string(),
            recoverable,
        }));
        e
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(AuthError::invalid("email", "Email is required"));
    }
    if password.is_empty() {
        return Err(AuthError::invalid("password", "Password is required"));
    }
    Ok(())
}
