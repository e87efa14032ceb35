//! Settings for dynform.
//!
//! [`Settings`] holds the ambient configuration shared by every form instance:
//! logging, and how remote option lists are fetched. Every field has a default
//! so a partial settings file only overrides what it names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for remote option fetches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Per-request timeout in seconds. `0` disables the timeout.
    pub timeout_secs: u64,
    /// The `User-Agent` header sent with option requests.
    pub user_agent: String,
    /// Extra headers sent with every option request.
    pub headers: HashMap<String, String>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("dynform/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
        }
    }
}

/// The complete set of dynform settings.
///
/// # Examples
///
/// ```
/// use dynform_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// assert_eq!(settings.remote.timeout_secs, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Whether debug mode is enabled. Selects pretty logs over JSON logs.
    pub debug: bool,

    /// The log filter directive (e.g. "info", "dynform_forms=debug").
    pub log_level: String,

    /// Remote option fetch configuration.
    pub remote: RemoteSettings,

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            remote: RemoteSettings::default(),
            extra: HashMap::new(),
        }
    }
}
