//! GoTrue email/password authentication.

use async_trait::async_trait;
use bridge_traits::http::HttpMethod;
use bridge_traits::time::Clock;
use chrono::{Duration, TimeZone, Utc};
use core_auth::{AuthError, AuthProvider, AuthSession, AuthUser, SignUpOutcome, SignUpRequest};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::connector::SupabaseClient;
use crate::error::SupabaseError;
use crate::types::{
    PasswordGrant, RefreshGrant, SignUpBody, SignUpMetadata, SignUpResponse, TokenResponse,
    UserResponse,
};

pub struct SupabaseAuth {
    client: Arc<SupabaseClient>,
    clock: Arc<dyn Clock>,
}

impl SupabaseAuth {
    pub fn new(client: Arc<SupabaseClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    fn session_from(&self, token: TokenResponse) -> AuthSession {
        let expires_at = token
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| self.clock.now() + Duration::seconds(token.expires_in));

        AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: user_from(token.user),
        }
    }

    async fn token_grant<B: serde::Serialize>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<TokenResponse, SupabaseError> {
        let url = self
            .client
            .auth_url(&format!("token?grant_type={}", grant_type));
        let request = self.client.anon_request(HttpMethod::Post, url).json(body)?;
        let response = self.client.send(request).await?;
        SupabaseClient::parse(&response)
    }
}

fn user_from(user: UserResponse) -> AuthUser {
    AuthUser {
        id: user.id,
        email: user.email,
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: &SignUpRequest) -> core_auth::Result<SignUpOutcome> {
        let body = SignUpBody {
            email: request.email.trim(),
            password: &request.password,
            data: SignUpMetadata {
                display_name: request.display_name.trim(),
                account_type: request.account_type,
            },
        };
        let http_request = self
            .client
            .anon_request(HttpMethod::Post, self.client.auth_url("signup"))
            .json(&body)
            .map_err(SupabaseError::from)?;
        let response = self.client.send(http_request).await?;

        let outcome = match SupabaseClient::parse::<SignUpResponse>(&response)? {
            SignUpResponse::Session(token) => {
                let session = self.session_from(token);
                SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignUpResponse::User(user) => SignUpOutcome {
                user: user_from(user),
                session: None,
            },
        };

        info!(
            user_id = %outcome.user.id,
            confirmed = outcome.session.is_some(),
            "Account created"
        );
        Ok(outcome)
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> core_auth::Result<AuthSession> {
        let token = self
            .token_grant("password", &PasswordGrant { email, password })
            .await?;
        Ok(self.session_from(token))
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_session(&self, refresh_token: &str) -> core_auth::Result<AuthSession> {
        let token = self
            .token_grant("refresh_token", &RefreshGrant { refresh_token })
            .await
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;
        Ok(self.session_from(token))
    }

    #[instrument(skip(self, access_token))]
    async fn sign_out(&self, access_token: &str) -> core_auth::Result<()> {
        let request = self.client.request_with_token(
            HttpMethod::Post,
            self.client.auth_url("logout"),
            access_token,
        );
        if let Err(e) = self.client.send(request).await {
            warn!(error = %e, "Logout request rejected");
            return Err(e.into());
        }
        Ok(())
    }

    fn set_access_token(&self, access_token: Option<String>) {
        self.client.set_access_token(access_token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::test_support::{body_json, respond, MockHttpClient};
    use bridge_traits::time::FixedClock;
    use core_library::models::AccountType;

    const BASE: &str = "https://p.supabase.co";

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn auth(mock: MockHttpClient) -> (SupabaseAuth, Arc<SupabaseClient>) {
        let client = Arc::new(SupabaseClient::new(Arc::new(mock), BASE, "anon"));
        let auth = SupabaseAuth::new(client.clone(), Arc::new(FixedClock::new(now())));
        (auth, client)
    }

    const TOKEN: &str = r#"{
        "access_token": "jwt", "refresh_token": "rt", "token_type": "bearer",
        "expires_in": 3600, "user": { "id": "u1", "email": "a@b.c" }
    }"#;

    #[tokio::test]
    async fn test_password_grant() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.url == format!("{}/auth/v1/token?grant_type=password", BASE)
                    && req.headers.get("Authorization").map(String::as_str) == Some("Bearer anon")
                    && body_json(req) == serde_json::json!({ "email": "a@b.c", "password": "secret1" })
            })
            .returning(|_| Ok(respond(200, TOKEN)));

        let (auth, _) = auth(mock);
        let session = auth.sign_in_with_password("a@b.c", "secret1").await.unwrap();

        assert_eq!(session.user.id, "u1");
        assert_eq!(session.expires_at, now() + Duration::hours(1));
    }

    #[tokio::test]
    async fn test_bad_credentials_keep_backend_message() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(respond(
                400,
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
            ))
        });

        let (auth, _) = auth(mock);
        let err = auth.sign_in_with_password("a@b.c", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed(_)));
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_sign_up_sends_profile_metadata() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                let body = body_json(req);
                req.url == format!("{}/auth/v1/signup", BASE)
                    && body["email"] == "nina@example.com"
                    && body["data"]["display_name"] == "Nina"
                    && body["data"]["account_type"] == "artist"
            })
            .returning(|_| Ok(respond(200, r#"{"id":"u9","email":"nina@example.com"}"#)));

        let (auth, _) = auth(mock);
        let outcome = auth
            .sign_up(&SignUpRequest::new(
                " nina@example.com ",
                "secret1",
                "Nina",
                AccountType::Artist,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.user.id, "u9");
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn test_refresh_failure_is_reported_as_refresh_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| req.url.ends_with("/auth/v1/token?grant_type=refresh_token"))
            .returning(|_| Ok(respond(400, r#"{"msg":"Invalid Refresh Token"}"#)));

        let (auth, _) = auth(mock);
        assert!(matches!(
            auth.refresh_session("rt").await,
            Err(AuthError::TokenRefreshFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_uses_user_token_and_token_is_shared() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .withf(|req| {
                req.url == format!("{}/auth/v1/logout", BASE)
                    && req.headers.get("Authorization").map(String::as_str) == Some("Bearer jwt")
            })
            .returning(|_| Ok(respond(204, "")));

        let (auth, client) = auth(mock);
        auth.set_access_token(Some("jwt".to_string()));
        assert!(client.is_authenticated());

        auth.sign_out("jwt").await.unwrap();
    }
}
