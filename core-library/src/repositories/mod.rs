//! # Repository Traits
//!
//! One trait per remote table. The coordinator and the services depend on
//! these traits only; the hosted backend provider implements all of them.
//!
//! ## Available Repositories
//!
//! - `UserProfileRepository` - `user_profiles` rows keyed by auth user id
//! - `ArtistRepository` - artists with owner, search and CRUD
//! - `AlbumRepository` - albums per artist
//! - `TrackRepository` - tracks per album, search, and the playback counters
//!
//! All calls go straight to the backend: no caching, no retry.

pub mod album;
pub mod artist;
pub mod track;
pub mod user_profile;

pub use album::AlbumRepository;
pub use artist::ArtistRepository;
pub use track::TrackRepository;
pub use user_profile::UserProfileRepository;
