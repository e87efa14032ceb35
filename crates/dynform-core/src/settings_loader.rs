//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `DYNFORM_DEBUG` | `debug` |
//! | `DYNFORM_LOG_LEVEL` | `log_level` |
//! | `DYNFORM_FETCH_TIMEOUT` | `remote.timeout_secs` |
//! | `DYNFORM_USER_AGENT` | `remote.user_agent` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use dynform_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/dynform.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::FormError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Keys missing from the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, FormError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let content = read_config_file(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, FormError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let content = read_config_file(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// Unparseable numeric values are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("DYNFORM_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("DYNFORM_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("DYNFORM_FETCH_TIMEOUT") {
        if let Ok(secs) = val.trim().parse::<u64>() {
            settings.remote.timeout_secs = secs;
        }
    }

    if let Ok(val) = std::env::var("DYNFORM_USER_AGENT") {
        settings.remote.user_agent = val;
    }
}

/// Converts a TOML value to a `serde_json::Value`.
///
/// Shared with the schema loader so TOML and JSON documents go through the
/// same serde path.
pub fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

fn read_config_file(path: &Path, format: &str) -> Result<String, FormError> {
    std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!(path = %path.display(), format, error = %e, "Failed to read settings file");
        FormError::IoError(e)
    })
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, FormError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        FormError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        FormError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            log_level = "dynform_forms=debug"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "dynform_forms=debug");
        // Defaults preserved
        assert_eq!(settings.remote.timeout_secs, 10);
    }

    #[test]
    fn test_from_toml_str_remote_table() {
        let toml = r#"
            [remote]
            timeout_secs = 2

            [remote.headers]
            Authorization = "Bearer abc"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.remote.timeout_secs, 2);
        assert_eq!(settings.remote.headers["Authorization"], "Bearer abc");
        assert!(settings.remote.user_agent.starts_with("dynform/"));
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(FormError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str(r#"debug = "sometimes""#);
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{ "debug": false, "remote": { "user_agent": "forms-test" } }"#;

        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.remote.user_agent, "forms-test");
        assert_eq!(settings.remote.timeout_secs, 10);
    }

    #[test]
    fn test_from_json_str_extra() {
        let json = r#"{ "extra": { "theme": "dark" } }"#;
        let settings = from_json_str(json).unwrap();
        assert_eq!(settings.extra["theme"], serde_json::json!("dark"));
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/nonexistent/dynform.toml");
        assert!(matches!(result, Err(FormError::IoError(ref e)) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_from_json_file_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("dynform-settings-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "log_level": "warn" }"#).unwrap();
        let settings = from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(settings.log_level, "warn");
    }

    // ── Helpers ─────────────────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({ "a": { "b": 1, "c": 2 } });
        let over = serde_json::json!({ "a": { "c": 3 } });
        assert_eq!(
            merge_json(base, over),
            serde_json::json!({ "a": { "b": 1, "c": 3 } })
        );
    }

    #[test]
    fn test_toml_to_json_array() {
        let value: toml::Value = toml::from_str("xs = [1, 2]").unwrap();
        assert_eq!(toml_to_json(value), serde_json::json!({ "xs": [1, 2] }));
    }
}
