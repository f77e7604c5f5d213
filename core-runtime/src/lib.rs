//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Encore core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! Every other core crate depends on this one for its logging conventions,
//! the validated [`CoreConfig`](config::CoreConfig) and the shared
//! [`EventBus`](events::EventBus).

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
