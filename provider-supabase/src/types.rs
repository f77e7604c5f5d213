//! Supabase wire types
//!
//! Request and response bodies of the GoTrue auth API and the Storage API.
//! Table rows deserialize straight into `core_library::models`.

use core_library::models::AccountType;
use serde::{Deserialize, Serialize};

/// GoTrue user object.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// GoTrue session (token grant and auto-confirmed sign-up).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
    /// Absolute expiry as a Unix timestamp, when the server sends it.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: UserResponse,
}

/// Sign-up response: a full session when the project auto-confirms
/// emails, otherwise just the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    User(UserResponse),
}

/// User metadata stored with the account at sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpMetadata<'a> {
    pub display_name: &'a str,
    pub account_type: AccountType,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: SignUpMetadata<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

/// Storage bulk delete body.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveObjects<'a> {
    pub prefixes: &'a [String],
}
