//! # Library Module
//!
//! Domain model and data-access contracts for the Encore catalog.
//!
//! ## Overview
//!
//! This crate owns:
//! - Models for user profiles, artists, albums and tracks
//! - Repository traits, one per remote table
//! - The table query model providers translate into requests
//! - Object storage naming and the `AssetStorage` contract
//!
//! It performs no I/O itself. Every trait is implemented by a backend
//! provider crate and injected into the services.

pub mod error;
pub mod models;
pub mod query;
pub mod repositories;
pub mod storage;

pub use error::{LibraryError, Result};
pub use repositories::{AlbumRepository, ArtistRepository, TrackRepository, UserProfileRepository};
pub use storage::{AssetFolder, AssetStorage, AssetUploader, Bucket};
