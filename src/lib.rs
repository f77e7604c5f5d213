//! Workspace placeholder crate.
//!
//! This crate exposes shared feature flags that map to the individual
//! workspace crates. Host applications can depend on `encore-workspace`,
//! enable the documented features, and reach the service façade through the
//! re-export below without wiring each crate individually.

#[cfg(any(feature = "desktop-shims", feature = "secure-store"))]
pub use core_service;
