use async_trait::async_trait;
use bridge_desktop::MemorySecureStore;
use bridge_traits::storage::SecureStore;
use bridge_traits::time::FixedClock;
use chrono::{Duration, TimeZone, Utc};
use core_auth::session_store::SESSION_KEY;
use core_auth::{
    AuthError, AuthManager, AuthProvider, AuthSession, AuthState, AuthUser, SignUpOutcome,
    SignUpRequest,
};
use core_library::models::{AccountType, UserProfile};
use core_library::repositories::UserProfileRepository;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn session(user_id: &str, token: &str, expires_in: Duration) -> AuthSession {
    AuthSession {
        access_token: token.to_string(),
        refresh_token: format!("{}-refresh", token),
        expires_at: now() + expires_in,
        user: AuthUser {
            id: user_id.to_string(),
            email: Some(format!("{}@example.com", user_id)),
        },
    }
}

#[derive(Default)]
struct FakeProvider {
    token: Mutex<Option<String>>,
    sign_up_session: bool,
    reject_sign_in: bool,
    fail_refresh: bool,
    fail_sign_out: bool,
    refreshed: Mutex<Vec<String>>,
    revoked: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthProvider for FakeProvider {
    async fn sign_up(&self, request: &SignUpRequest) -> core_auth::Result<SignUpOutcome> {
        let user = AuthUser {
            id: "new-user".to_string(),
            email: Some(request.email.clone()),
        };
        let session = self
            .sign_up_session
            .then(|| session("new-user", "signup-token", Duration::hours(1)));
        Ok(SignUpOutcome { user, session })
    }

    async fn sign_in_with_password(
        &self,
        _email: &str,
        password: &str,
    ) -> core_auth::Result<AuthSession> {
        if self.reject_sign_in || password != "secret1" {
            return Err(AuthError::AuthenticationFailed(
                "Invalid login credentials".to_string(),
            ));
        }
        Ok(session("u1", "token-1", Duration::hours(1)))
    }

    async fn refresh_session(&self, refresh_token: &str) -> core_auth::Result<AuthSession> {
        self.refreshed
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if self.fail_refresh {
            return Err(AuthError::TokenRefreshFailed("expired".to_string()));
        }
        Ok(session("u1", "token-2", Duration::hours(1)))
    }

    async fn sign_out(&self, access_token: &str) -> core_auth::Result<()> {
        self.revoked.lock().unwrap().push(access_token.to_string());
        if self.fail_sign_out {
            return Err(AuthError::Network("offline".to_string()));
        }
        Ok(())
    }

    fn set_access_token(&self, access_token: Option<String>) {
        *self.token.lock().unwrap() = access_token;
    }
}

#[derive(Default)]
struct FakeProfiles {
    rows: Mutex<HashMap<String, UserProfile>>,
}

impl FakeProfiles {
    fn with(profile: UserProfile) -> Self {
        let profiles = Self::default();
        profiles
            .rows
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
        profiles
    }
}

#[async_trait]
impl UserProfileRepository for FakeProfiles {
    async fn find_by_id(&self, id: &str) -> core_library::Result<Option<UserProfile>> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn upsert(&self, profile: &UserProfile) -> core_library::Result<UserProfile> {
        self.rows
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile.clone());
        Ok(profile.clone())
    }
}

struct Harness {
    manager: AuthManager,
    provider: Arc<FakeProvider>,
    profiles: Arc<FakeProfiles>,
    store: Arc<MemorySecureStore>,
    bus: EventBus,
}

fn harness(provider: FakeProvider, profiles: FakeProfiles) -> Harness {
    let provider = Arc::new(provider);
    let profiles = Arc::new(profiles);
    let store = Arc::new(MemorySecureStore::new());
    let bus = EventBus::new(16);
    let manager = AuthManager::new(
        provider.clone(),
        profiles.clone(),
        store.clone(),
        bus.clone(),
        Arc::new(FixedClock::new(now())),
    );
    Harness {
        manager,
        provider,
        profiles,
        store,
        bus,
    }
}

fn artist_profile() -> UserProfile {
    let mut profile = UserProfile::new("u1", AccountType::Artist);
    profile.display_name = Some("Nina".to_string());
    profile
}

#[tokio::test]
async fn test_sign_in_stores_session_and_loads_profile() {
    let h = harness(FakeProvider::default(), FakeProfiles::with(artist_profile()));
    let mut events = h.bus.subscribe();

    let profile = h.manager.sign_in("u1@example.com", "secret1").await.unwrap();

    assert_eq!(profile, Some(artist_profile()));
    assert!(h.manager.is_artist().await);
    assert_eq!(h.manager.state().await, AuthState::SignedIn);
    assert_eq!(h.provider.token(), Some("token-1".to_string()));
    assert!(h.store.has_secret(SESSION_KEY).await.unwrap());
    assert_eq!(h.manager.require_user_id().await.unwrap(), "u1");

    match events.recv().await.unwrap() {
        CoreEvent::Auth(AuthEvent::SignedIn { user_id }) => assert_eq!(user_id, "u1"),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_sign_in_rejected_keeps_signed_out() {
    let h = harness(
        FakeProvider {
            reject_sign_in: true,
            ..Default::default()
        },
        FakeProfiles::default(),
    );
    let mut events = h.bus.subscribe();

    let err = h.manager.sign_in("u1@example.com", "secret1").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid login credentials");
    assert_eq!(h.manager.state().await, AuthState::SignedOut);
    assert!(!h.store.has_secret(SESSION_KEY).await.unwrap());

    assert!(matches!(
        events.recv().await.unwrap(),
        CoreEvent::Auth(AuthEvent::AuthError { .. })
    ));
}

#[tokio::test]
async fn test_sign_in_without_profile_row() {
    let h = harness(FakeProvider::default(), FakeProfiles::default());

    let profile = h.manager.sign_in("u1@example.com", "secret1").await.unwrap();
    assert!(profile.is_none());
    assert!(!h.manager.is_artist().await);
    assert!(h.manager.current_session().await.is_some());
}

#[tokio::test]
async fn test_sign_in_validates_input() {
    let h = harness(FakeProvider::default(), FakeProfiles::default());

    assert!(matches!(
        h.manager.sign_in("  ", "secret1").await,
        Err(AuthError::InvalidInput { .. })
    ));
    assert!(matches!(
        h.manager.sign_in("u1@example.com", "").await,
        Err(AuthError::InvalidInput { .. })
    ));
}

#[tokio::test]
async fn test_sign_up_creates_profile_without_session() {
    let h = harness(FakeProvider::default(), FakeProfiles::default());

    let profile = h
        .manager
        .sign_up(SignUpRequest::new(
            "nina@example.com",
            "secret1",
            " Nina ",
            AccountType::Artist,
        ))
        .await
        .unwrap();

    assert_eq!(profile.id, "new-user");
    assert_eq!(profile.display_name.as_deref(), Some("Nina"));
    assert!(profile.is_artist());
    assert!(h.profiles.rows.lock().unwrap().contains_key("new-user"));

    // Confirmation pending: still signed out.
    assert_eq!(h.manager.state().await, AuthState::SignedOut);
    assert_eq!(h.provider.token(), None);
}

#[tokio::test]
async fn test_sign_up_with_immediate_session_signs_in() {
    let h = harness(
        FakeProvider {
            sign_up_session: true,
            ..Default::default()
        },
        FakeProfiles::default(),
    );

    h.manager
        .sign_up(SignUpRequest::new(
            "a@example.com",
            "secret1",
            "A",
            AccountType::User,
        ))
        .await
        .unwrap();

    assert_eq!(h.manager.state().await, AuthState::SignedIn);
    assert_eq!(h.provider.token(), Some("signup-token".to_string()));
    assert!(!h.manager.is_artist().await);
}

#[tokio::test]
async fn test_sign_up_rejects_short_password() {
    let h = harness(FakeProvider::default(), FakeProfiles::default());

    let err = h
        .manager
        .sign_up(SignUpRequest::new("a@example.com", "12345", "A", AccountType::User))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "password: Password must be at least 6 characters");
}

#[tokio::test]
async fn test_sign_out_clears_local_state_even_if_remote_fails() {
    let h = harness(
        FakeProvider {
            fail_sign_out: true,
            ..Default::default()
        },
        FakeProfiles::with(artist_profile()),
    );
    h.manager.sign_in("u1@example.com", "secret1").await.unwrap();

    h.manager.sign_out().await.unwrap();

    assert_eq!(h.provider.revoked.lock().unwrap().as_slice(), ["token-1"]);
    assert_eq!(h.manager.state().await, AuthState::SignedOut);
    assert!(h.manager.current_profile().await.is_none());
    assert_eq!(h.provider.token(), None);
    assert!(!h.store.has_secret(SESSION_KEY).await.unwrap());
    assert!(matches!(
        h.manager.require_user_id().await,
        Err(AuthError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_restore_fresh_session_without_refresh() {
    let h = harness(FakeProvider::default(), FakeProfiles::with(artist_profile()));
    let stored = session("u1", "stored", Duration::hours(1));
    h.store
        .set_secret(SESSION_KEY, &serde_json::to_vec(&stored).unwrap())
        .await
        .unwrap();
    let mut events = h.bus.subscribe();

    let profile = h.manager.restore_session().await.unwrap();

    assert!(profile.unwrap().is_artist());
    assert!(h.provider.refreshed.lock().unwrap().is_empty());
    assert_eq!(h.provider.token(), Some("stored".to_string()));
    match events.recv().await.unwrap() {
        CoreEvent::Auth(AuthEvent::SessionRestored { refreshed, .. }) => assert!(!refreshed),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_restore_refreshes_session_expiring_soon() {
    let h = harness(FakeProvider::default(), FakeProfiles::with(artist_profile()));
    let stored = session("u1", "stored", Duration::minutes(4));
    h.store
        .set_secret(SESSION_KEY, &serde_json::to_vec(&stored).unwrap())
        .await
        .unwrap();

    h.manager.restore_session().await.unwrap();

    assert_eq!(
        h.provider.refreshed.lock().unwrap().as_slice(),
        ["stored-refresh"]
    );
    assert_eq!(h.provider.token(), Some("token-2".to_string()));

    let saved: AuthSession = serde_json::from_slice(
        &h.store.get_secret(SESSION_KEY).await.unwrap().unwrap(),
    )
    .unwrap();
    assert_eq!(saved.access_token, "token-2");
}

#[tokio::test]
async fn test_restore_discards_session_that_cannot_refresh() {
    let h = harness(
        FakeProvider {
            fail_refresh: true,
            ..Default::default()
        },
        FakeProfiles::default(),
    );
    let stored = session("u1", "stored", -Duration::hours(2));
    h.store
        .set_secret(SESSION_KEY, &serde_json::to_vec(&stored).unwrap())
        .await
        .unwrap();

    assert!(h.manager.restore_session().await.unwrap().is_none());
    assert_eq!(h.manager.state().await, AuthState::SignedOut);
    assert!(!h.store.has_secret(SESSION_KEY).await.unwrap());
}

#[tokio::test]
async fn test_restore_with_nothing_stored() {
    let h = harness(FakeProvider::default(), FakeProfiles::default());
    assert!(h.manager.restore_session().await.unwrap().is_none());

    h.store.set_secret(SESSION_KEY, b"{broken").await.unwrap();
    assert!(h.manager.restore_session().await.unwrap().is_none());
}
