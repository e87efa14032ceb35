//! Form schema: field descriptors and form-level configuration.
//!
//! A [`FieldSpec`] describes one input: its name, label, [`FieldType`],
//! render order, validation [`Rule`], grid [`Layout`], and optional static
//! options, remote source, or dependents. A [`FormSchema`] is the ordered
//! list of fields plus a [`FormConfig`].
//!
//! Schemas are checked once with [`FormSchema::validate`]; a defective
//! schema is rejected before anything is rendered. After that, fields are
//! addressed through [`FieldId`], which can only be obtained from the schema
//! itself.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use dynform_core::{FormError, FormResult};

use crate::dependency::DependencyGraph;
use crate::rules::Rule;
use crate::value::FieldValue;

/// Largest breakpoint value of the twelve-column grid.
pub const GRID_COLUMNS: u8 = 12;

/// The declared input type of a field.
///
/// Unrecognized type strings deserialize as [`FieldType::Unknown`] and render
/// with the default text strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    Text,
    /// A number.
    Number,
    /// A calendar date.
    Date,
    /// A file picker.
    File,
    /// A searchable single select.
    Autocomplete,
    /// Any other declared type.
    #[serde(other)]
    Unknown,
}

/// Grid breakpoints for one field, each in `0..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Extra-small screens.
    pub xs: u8,
    /// Small screens.
    pub sm: u8,
    /// Medium screens.
    pub md: u8,
    /// Large screens.
    pub lg: u8,
    /// Extra-large screens.
    pub xl: u8,
}

impl Layout {
    /// Creates a layout from five breakpoints.
    pub const fn new(xs: u8, sm: u8, md: u8, lg: u8, xl: u8) -> Self {
        Self { xs, sm, md, lg, xl }
    }

    /// Full width on every breakpoint.
    pub const fn full() -> Self {
        Self::new(GRID_COLUMNS, GRID_COLUMNS, GRID_COLUMNS, GRID_COLUMNS, GRID_COLUMNS)
    }

    /// Full width on small screens, half width from `md` up.
    pub const fn half() -> Self {
        Self::new(GRID_COLUMNS, GRID_COLUMNS, 6, 6, 6)
    }

    /// Returns the breakpoints as `(name, value)` pairs, smallest first.
    pub const fn breakpoints(&self) -> [(&'static str, u8); 5] {
        [
            ("xs", self.xs),
            ("sm", self.sm),
            ("md", self.md),
            ("lg", self.lg),
            ("xl", self.xl),
        ]
    }

    fn validate(&self, field: &str) -> FormResult<()> {
        for (name, value) in self.breakpoints() {
            if value > GRID_COLUMNS {
                return Err(FormError::ImproperlyConfigured(format!(
                    "field '{field}': layout breakpoint {name}={value} exceeds {GRID_COLUMNS}"
                )));
            }
        }
        Ok(())
    }
}

/// One selectable option: `id` is stored, `value` is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// The stored identifier.
    pub id: String,
    /// The display label.
    pub value: String,
}

impl SelectOption {
    /// Creates a new option.
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Where a field's options are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    /// The endpoint returning `[{id, value}]`.
    pub url: String,
}

/// A field whose options depend on this field's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependent {
    /// URL prefix; the parent's value is appended to it.
    pub child_url: String,
    /// Name of the dependent field.
    pub child_field: String,
}

/// Dependency declaration on a parent field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Whether this field drives other fields.
    pub is_parent: bool,
    /// The dependents, in cascade order.
    #[serde(default)]
    pub dependents: Vec<Dependent>,
}

/// Complete description of one form field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Unique key; the HTML `name` attribute and payload key.
    pub name: String,
    /// Human-readable label rendered above the input.
    pub label: String,
    /// Declared input type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Render position; lower first.
    pub order: i64,
    /// Placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Size variant (e.g. "small"); "medium" when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Validation rule; any string is accepted when absent.
    #[serde(
        default,
        rename = "validationRule",
        alias = "validation",
        skip_serializing_if = "Option::is_none"
    )]
    pub rule: Option<Rule>,
    /// Grid breakpoints. Required; kept optional so a missing layout is
    /// reported by [`FormSchema::validate`] with the field's name.
    #[serde(default, alias = "gridItemProps")]
    pub layout: Option<Layout>,
    /// Static options for autocomplete fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    /// Remote option source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_source: Option<RemoteSource>,
    /// Dependents of this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Dependency>,
    /// Render a date field as a `DD/MM/YYYY` calendar picker.
    #[serde(default)]
    pub date_picker: bool,
    /// MIME filter for file fields; `image/*` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
}

/// Size variant used when a field declares none.
pub const DEFAULT_SIZE: &str = "medium";

/// MIME filter used by file fields that declare none.
pub const DEFAULT_ACCEPT: &str = "image/*";

impl FieldSpec {
    /// Creates a field with no rule, no layout, and no options.
    ///
    /// A layout must be set before the schema validates.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
        order: i64,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            order,
            placeholder: None,
            size: None,
            rule: None,
            layout: None,
            options: None,
            remote_source: None,
            dependency: None,
            date_picker: false,
            accept: None,
        }
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets the size variant.
    #[must_use]
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Sets the validation rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Sets the grid layout.
    #[must_use]
    pub const fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Sets static options.
    #[must_use]
    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the remote option source.
    #[must_use]
    pub fn remote(mut self, url: impl Into<String>) -> Self {
        self.remote_source = Some(RemoteSource { url: url.into() });
        self
    }

    /// Declares a dependent field whose options come from
    /// `child_url + <this field's value>`.
    #[must_use]
    pub fn dependent(mut self, child_field: impl Into<String>, child_url: impl Into<String>) -> Self {
        let dependency = self.dependency.get_or_insert_with(|| Dependency {
            is_parent: true,
            dependents: Vec::new(),
        });
        dependency.dependents.push(Dependent {
            child_url: child_url.into(),
            child_field: child_field.into(),
        });
        self
    }

    /// Renders a date field as a calendar picker.
    #[must_use]
    pub const fn date_picker(mut self, enabled: bool) -> Self {
        self.date_picker = enabled;
        self
    }

    /// Sets the file MIME filter.
    #[must_use]
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// The size variant, falling back to [`DEFAULT_SIZE`].
    pub fn size_or_default(&self) -> &str {
        self.size.as_deref().unwrap_or(DEFAULT_SIZE)
    }

    /// The file MIME filter, falling back to [`DEFAULT_ACCEPT`].
    pub fn accept_or_default(&self) -> &str {
        self.accept.as_deref().unwrap_or(DEFAULT_ACCEPT)
    }

    /// Declared dependents, empty for fields that are not parents.
    pub fn dependents(&self) -> &[Dependent] {
        self.dependency
            .as_ref()
            .filter(|d| d.is_parent)
            .map_or(&[], |d| d.dependents.as_slice())
    }

    fn validate(&self) -> FormResult<()> {
        if self.name.trim().is_empty() {
            return Err(FormError::ImproperlyConfigured(
                "field name must not be empty".to_string(),
            ));
        }
        let layout = self.layout.as_ref().ok_or_else(|| {
            FormError::ImproperlyConfigured(format!("field '{}': missing layout", self.name))
        })?;
        layout.validate(&self.name)?;

        if let Some(rule) = &self.rule {
            rule.check_consistency().map_err(|e| {
                FormError::ImproperlyConfigured(format!("field '{}': {e}", self.name))
            })?;
        }

        if let Some(dependency) = &self.dependency {
            if !dependency.is_parent && !dependency.dependents.is_empty() {
                return Err(FormError::ImproperlyConfigured(format!(
                    "field '{}' declares dependents but isParent is false",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Stable sort by `order` ascending; equal orders keep their input sequence.
pub fn sort_fields(fields: &[FieldSpec]) -> Vec<&FieldSpec> {
    let mut sorted: Vec<&FieldSpec> = fields.iter().collect();
    sorted.sort_by_key(|f| f.order);
    sorted
}

/// A validated handle to one field of a [`FormSchema`].
///
/// Only produced by the schema, so indexing state with it cannot miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(usize);

impl FieldId {
    /// The field's position in declaration order.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Grid container settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridContainer {
    /// Gap between grid items, in spacing units.
    #[serde(default)]
    pub spacing: u8,
}

/// Submit button settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitButtonConfig {
    /// CSS `display` of the button row.
    pub display: String,
    /// CSS `justify-content` of the button row.
    pub justify_content: String,
    /// Button variant (e.g. "contained", "outlined").
    pub variant: String,
    /// Button color (e.g. "primary").
    pub color: String,
    /// Button text.
    pub label: String,
}

impl Default for SubmitButtonConfig {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            justify_content: "left".to_string(),
            variant: "contained".to_string(),
            color: "primary".to_string(),
            label: "Submit".to_string(),
        }
    }
}

/// Form-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    /// Initial values keyed by field name; unnamed fields start `Null`.
    pub default_values: BTreeMap<String, FieldValue>,
    /// Grid container settings.
    #[serde(alias = "layoutConfig")]
    pub grid_container: GridContainer,
    /// Submit button settings.
    #[serde(alias = "submitButtonConfig")]
    pub submit_button: SubmitButtonConfig,
}

/// The full declarative description of a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSchema {
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Form-level configuration.
    #[serde(default)]
    pub config: FormConfig,
}

impl FormSchema {
    /// Creates a schema with default configuration.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            config: FormConfig::default(),
        }
    }

    /// Sets the form configuration.
    #[must_use]
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets one default value.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.config.default_values.insert(name.into(), value.into());
        self
    }

    /// Checks every invariant a renderable schema must hold.
    ///
    /// - field names are non-empty and unique
    /// - every field has a layout with breakpoints `<= 12`
    /// - rules are consistent with their kind
    /// - default values name existing fields
    /// - dependents name existing fields and form no cycle
    pub fn validate(&self) -> FormResult<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate()?;
            if !seen.insert(field.name.as_str()) {
                return Err(FormError::ImproperlyConfigured(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        for name in self.config.default_values.keys() {
            if !seen.contains(name.as_str()) {
                return Err(FormError::ImproperlyConfigured(format!(
                    "default value given for unknown field '{name}'"
                )));
            }
        }
        DependencyGraph::build(self)?;
        Ok(())
    }

    /// Looks up a field by name.
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.fields.iter().position(|f| f.name == name).map(FieldId)
    }

    /// Looks up a field by name, failing with [`FormError::UnknownField`].
    pub fn require_field(&self, name: &str) -> FormResult<FieldId> {
        self.field_id(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    /// Returns the field behind an id.
    pub fn field(&self, id: FieldId) -> &FieldSpec {
        &self.fields[id.0]
    }

    /// All field ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        (0..self.fields.len()).map(FieldId)
    }

    /// Field ids in render order (stable by `order`).
    pub fn sorted_ids(&self) -> Vec<FieldId> {
        let mut ids: Vec<FieldId> = self.ids().collect();
        ids.sort_by_key(|id| self.fields[id.0].order);
        ids
    }

    /// The configured initial value of a field, `Null` if none.
    pub fn default_value(&self, id: FieldId) -> FieldValue {
        self.config
            .default_values
            .get(&self.fields[id.0].name)
            .cloned()
            .unwrap_or_default()
    }
}
