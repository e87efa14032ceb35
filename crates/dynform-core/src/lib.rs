//! # dynform-core
//!
//! Core types, settings, logging, and error types for dynform.
//! This crate has no form logic and provides the foundation for the other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings with defaults
//! - [`settings_loader`] - TOML/JSON settings loading with env overrides
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - HTML helpers

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{FetchError, FormError, FormResult, ValidationError};
pub use settings::{RemoteSettings, Settings};
