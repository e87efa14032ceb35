//! Loading form schemas from JSON or TOML documents.
//!
//! Both formats go through the same serde model as [`FormSchema`]; TOML is
//! converted to JSON first, as the settings loader does. Every loaded schema
//! is validated before it is returned.
//!
//! ```
//! use dynform_forms::schema_loader;
//!
//! let schema = schema_loader::from_toml_str(r#"
//!     [[fields]]
//!     name = "firstName"
//!     label = "First name"
//!     type = "text"
//!     order = 1
//!     layout = { xs = 12, sm = 12, md = 6, lg = 6, xl = 6 }
//! "#).unwrap();
//! assert_eq!(schema.fields[0].name, "firstName");
//! ```

use std::path::Path;

use dynform_core::settings_loader::toml_to_json;
use dynform_core::{FormError, FormResult};

use crate::schema::FormSchema;

/// Parses and validates a schema from a JSON string.
pub fn from_json_str(json: &str) -> FormResult<FormSchema> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| FormError::ImproperlyConfigured(format!("Failed to parse schema JSON: {e}")))?;
    from_value(value, "JSON")
}

/// Parses and validates a schema from a TOML string.
pub fn from_toml_str(toml_str: &str) -> FormResult<FormSchema> {
    let value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormError::ImproperlyConfigured(format!("Failed to parse schema TOML: {e}")))?;
    from_value(toml_to_json(value), "TOML")
}

/// Reads a schema file, choosing the format by extension (`.toml` or JSON).
pub fn from_file(path: impl AsRef<Path>) -> FormResult<FormSchema> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Failed to read schema file");
        FormError::IoError(e)
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => from_toml_str(&content),
        _ => from_json_str(&content),
    }
}

fn from_value(value: serde_json::Value, format: &str) -> FormResult<FormSchema> {
    let schema: FormSchema = serde_json::from_value(value).map_err(|e| {
        FormError::ImproperlyConfigured(format!("Invalid schema in {format}: {e}"))
    })?;
    schema.validate()?;
    tracing::debug!(fields = schema.fields.len(), format, "Loaded form schema");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use crate::value::FieldValue;

    const PROFILE_JSON: &str = r#"{
        "fields": [
            {"name": "firstName", "label": "First name", "type": "text", "order": 1,
             "placeholder": "Ana",
             "validationRule": {"kind": "string", "constraints": [
                 {"type": "required", "message": "First name is required"}]},
             "layout": {"xs": 12, "sm": 12, "md": 6, "lg": 6, "xl": 6}},
            {"name": "country", "label": "Country", "type": "autocomplete", "order": 2,
             "remoteSource": {"url": "http://api/countries"},
             "dependency": {"isParent": true, "dependents": [
                 {"childUrl": "http://api/states?country=", "childField": "state"}]},
             "layout": {"xs": 12, "sm": 12, "md": 6, "lg": 6, "xl": 6}},
            {"name": "state", "label": "State", "type": "autocomplete", "order": 3,
             "gridItemProps": {"xs": 12, "sm": 12, "md": 6, "lg": 6, "xl": 6}}
        ],
        "config": {
            "defaultValues": {"firstName": ""},
            "layoutConfig": {"spacing": 2},
            "submitButtonConfig": {"label": "Save"}
        }
    }"#;

    #[test]
    fn test_from_json_str() {
        let schema = from_json_str(PROFILE_JSON).unwrap();
        assert_eq!(schema.fields.len(), 3);
        assert_eq!(schema.fields[1].field_type, FieldType::Autocomplete);
        assert_eq!(schema.fields[1].dependents()[0].child_field, "state");
        assert_eq!(schema.config.grid_container.spacing, 2);
        assert_eq!(schema.config.submit_button.label, "Save");
        assert_eq!(schema.config.submit_button.color, "primary");
        assert_eq!(schema.config.default_values["firstName"], FieldValue::from(""));
    }

    #[test]
    fn test_from_json_rejects_invalid_schema() {
        let json = r#"{"fields": [
            {"name": "a", "label": "A", "type": "text", "order": 1}
        ]}"#;
        let err = from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("missing layout"));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(from_json_str("{"), Err(FormError::ImproperlyConfigured(_))));
        let missing_label = r#"{"fields": [{"name": "a", "type": "text", "order": 1}]}"#;
        assert!(from_json_str(missing_label).is_err());
    }

    #[test]
    fn test_from_toml_str_with_dependents() {
        let toml = r#"
            [[fields]]
            name = "country"
            label = "Country"
            type = "autocomplete"
            order = 1
            layout = { xs = 12, sm = 12, md = 6, lg = 6, xl = 6 }
            remoteSource = { url = "http://api/countries" }

            [fields.dependency]
            isParent = true
            dependents = [{ childUrl = "http://api/states?country=", childField = "state" }]

            [[fields]]
            name = "state"
            label = "State"
            type = "autocomplete"
            order = 2
            layout = { xs = 12, sm = 12, md = 6, lg = 6, xl = 6 }

            [config.submitButton]
            justifyContent = "center"
        "#;
        let schema = from_toml_str(toml).unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].dependents().len(), 1);
        assert_eq!(schema.config.submit_button.justify_content, "center");
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file("/nonexistent/schema.json").unwrap_err();
        assert!(matches!(err, FormError::IoError(ref e) if e.kind() == std::io::ErrorKind::NotFound));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_from_file_json() {
        let path = std::env::temp_dir().join(format!("dynform-schema-{}.json", std::process::id()));
        std::fs::write(&path, PROFILE_JSON).unwrap();
        let schema = from_file(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(schema.unwrap().fields.len(), 3);
    }
}
