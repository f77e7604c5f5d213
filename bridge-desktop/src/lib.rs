//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides the host capabilities the Encore core can use out of
//! the box on desktop:
//! - `HttpClient` using `reqwest`
//! - `SecureStore` using the `keyring` crate (feature `secure-store`)
//! - `SecureStore` held in process memory, for tests and ephemeral sessions
//!
//! Audio output is not provided here; the host injects its own
//! `PlaybackAdapter`.
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{MemorySecureStore, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! let http = Arc::new(ReqwestHttpClient::new()?);
//! let store = Arc::new(MemorySecureStore::new());
//! ```

mod http;
mod memory_store;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use http::ReqwestHttpClient;
pub use memory_store::MemorySecureStore;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
