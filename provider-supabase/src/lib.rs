//! # Supabase Provider
//!
//! Implements the catalog repositories, asset storage and account
//! operations against a Supabase project.
//!
//! ## Overview
//!
//! This module provides:
//! - PostgREST table access for `user_profiles`, `artists`, `albums`, `tracks`
//! - Storage uploads, deletes and public URLs for the `images` and `audio`
//!   buckets
//! - GoTrue email/password sign-up, sign-in, refresh and logout
//!
//! Every component shares one [`SupabaseClient`], which carries the project
//! URL, the anon key and the bearer token of the signed-in user.

pub mod auth;
pub mod connector;
pub mod error;
pub mod rest;
pub mod storage;
pub mod types;

pub use auth::SupabaseAuth;
pub use connector::SupabaseClient;
pub use error::{Result, SupabaseError};
pub use rest::{
    SupabaseAlbumRepository, SupabaseArtistRepository, SupabaseTrackRepository,
    SupabaseUserProfileRepository,
};
pub use storage::SupabaseStorage;
