//! # Authentication Module
//!
//! Email/password accounts against the hosted backend.
//!
//! ## Overview
//!
//! [`AuthManager`] drives sign-up, sign-in, sign-out and session restore.
//! The backend itself sits behind [`AuthProvider`]; the session is persisted
//! through the host's `SecureStore` so the next launch can restore it.
//!
//! ## Features
//!
//! - Profile row (`user_profiles`) created on sign-up
//! - Session refresh when the stored session expires within five minutes
//! - Local state always cleared on sign-out, remote revocation best-effort
//! - Auth state event emission

pub mod error;
pub mod manager;
pub mod provider;
pub mod session_store;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::AuthManager;
pub use provider::AuthProvider;
pub use session_store::SessionStore;
pub use types::{AuthSession, AuthState, AuthUser, SignUpOutcome, SignUpRequest};
