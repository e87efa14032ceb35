//! Per-field containers owned by the form controller.
//!
//! [`FormState`] holds each field's value, error, and touched flag;
//! [`OptionsCache`] holds each field's resolved options. Both are indexed by
//! [`FieldId`] and sized from the schema when a form is mounted.

use dynform_core::ValidationError;

use crate::schema::{FieldId, FormSchema, SelectOption};
use crate::value::{FieldValue, FormValues};

/// Values, errors, and touched flags of every field.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    names: Vec<String>,
    values: Vec<FieldValue>,
    errors: Vec<Option<ValidationError>>,
    touched: Vec<bool>,
}

impl FormState {
    /// Creates state seeded with the schema's default values.
    pub fn new(schema: &FormSchema) -> Self {
        let len = schema.fields.len();
        Self {
            names: schema.fields.iter().map(|f| f.name.clone()).collect(),
            values: schema.ids().map(|id| schema.default_value(id)).collect(),
            errors: vec![None; len],
            touched: vec![false; len],
        }
    }

    /// Current value of a field.
    pub fn value(&self, id: FieldId) -> &FieldValue {
        &self.values[id.index()]
    }

    /// Replaces a field's value, returning the previous one.
    pub fn set_value(&mut self, id: FieldId, value: FieldValue) -> FieldValue {
        std::mem::replace(&mut self.values[id.index()], value)
    }

    /// Current error of a field; `None` means valid.
    pub fn error(&self, id: FieldId) -> Option<&ValidationError> {
        self.errors[id.index()].as_ref()
    }

    /// Sets or clears a field's error.
    pub fn set_error(&mut self, id: FieldId, error: Option<ValidationError>) {
        self.errors[id.index()] = error;
    }

    /// Whether a field has been blurred since the last reset.
    pub fn is_touched(&self, id: FieldId) -> bool {
        self.touched[id.index()]
    }

    /// Marks a field touched.
    pub fn touch(&mut self, id: FieldId) {
        self.touched[id.index()] = true;
    }

    /// Clears a field's value and error.
    pub fn clear(&mut self, id: FieldId) {
        self.values[id.index()] = FieldValue::Null;
        self.errors[id.index()] = None;
    }

    /// Snapshot of every value keyed by field name.
    pub fn values(&self) -> FormValues {
        self.names
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }

    /// Whether any field currently has an error.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(Option::is_some)
    }
}

/// Lifecycle of one field's remote options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// No fetch issued since the slot was last cleared.
    #[default]
    Idle,
    /// A fetch is outstanding.
    Fetching,
    /// The most recent fetch succeeded.
    Resolved,
    /// The most recent fetch failed; options are empty.
    Failed,
}

/// Options of one field plus the generation of its current fetch.
#[derive(Debug, Clone, Default)]
pub struct OptionSlot {
    /// Resolved options in endpoint order.
    pub options: Vec<SelectOption>,
    /// Where the slot is in its fetch lifecycle.
    pub status: FetchStatus,
    /// Bumped on every new fetch and on every clear.
    pub generation: u64,
}

/// Remote options of every field.
#[derive(Debug, Clone, Default)]
pub struct OptionsCache {
    slots: Vec<OptionSlot>,
}

impl OptionsCache {
    /// Creates an empty cache for a schema.
    pub fn new(schema: &FormSchema) -> Self {
        Self {
            slots: vec![OptionSlot::default(); schema.fields.len()],
        }
    }

    /// The slot of a field.
    pub fn slot(&self, id: FieldId) -> &OptionSlot {
        &self.slots[id.index()]
    }

    /// Resolved options of a field.
    pub fn options(&self, id: FieldId) -> &[SelectOption] {
        &self.slots[id.index()].options
    }

    /// Starts a new fetch and returns its generation.
    pub fn begin_fetch(&mut self, id: FieldId) -> u64 {
        let slot = &mut self.slots[id.index()];
        slot.generation += 1;
        slot.status = FetchStatus::Fetching;
        slot.generation
    }

    /// Whether `generation` is still the field's current fetch.
    pub fn is_current(&self, id: FieldId, generation: u64) -> bool {
        let slot = &self.slots[id.index()];
        slot.generation == generation && slot.status == FetchStatus::Fetching
    }

    /// Stores fetched options.
    pub fn resolve(&mut self, id: FieldId, options: Vec<SelectOption>) {
        let slot = &mut self.slots[id.index()];
        slot.options = options;
        slot.status = FetchStatus::Resolved;
    }

    /// Records a failed fetch; options become empty.
    pub fn fail(&mut self, id: FieldId) {
        let slot = &mut self.slots[id.index()];
        slot.options.clear();
        slot.status = FetchStatus::Failed;
    }

    /// Empties a slot and invalidates any in-flight fetch for it.
    pub fn clear(&mut self, id: FieldId) {
        let slot = &mut self.slots[id.index()];
        slot.options.clear();
        slot.status = FetchStatus::Idle;
        slot.generation += 1;
    }

    /// Whether any slot has a fetch outstanding.
    pub fn any_fetching(&self) -> bool {
        self.slots.iter().any(|s| s.status == FetchStatus::Fetching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, FieldType, Layout};

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::new("firstName", "First", FieldType::Text, 1).layout(Layout::full()),
            FieldSpec::new("country", "Country", FieldType::Autocomplete, 2).layout(Layout::full()),
        ])
        .with_default("firstName", "Ana")
    }

    #[test]
    fn test_form_state_defaults() {
        let schema = schema();
        let state = FormState::new(&schema);
        let first = schema.field_id("firstName").unwrap();
        let country = schema.field_id("country").unwrap();
        assert_eq!(state.value(first), &FieldValue::from("Ana"));
        assert_eq!(state.value(country), &FieldValue::Null);
        assert!(!state.has_errors());
        assert!(!state.is_touched(first));
    }

    #[test]
    fn test_form_state_set_and_clear() {
        let schema = schema();
        let mut state = FormState::new(&schema);
        let country = schema.field_id("country").unwrap();
        let previous = state.set_value(country, FieldValue::from("2"));
        assert_eq!(previous, FieldValue::Null);
        state.set_error(country, Some(ValidationError::new("bad", "custom")));
        assert!(state.has_errors());

        state.clear(country);
        assert_eq!(state.value(country), &FieldValue::Null);
        assert!(state.error(country).is_none());

        let values = state.values();
        assert_eq!(values.len(), 2);
        assert_eq!(values["firstName"], FieldValue::from("Ana"));
    }

    #[test]
    fn test_options_cache_lifecycle() {
        let schema = schema();
        let mut cache = OptionsCache::new(&schema);
        let country = schema.field_id("country").unwrap();
        assert_eq!(cache.slot(country).status, FetchStatus::Idle);

        let generation = cache.begin_fetch(country);
        assert!(cache.any_fetching());
        assert!(cache.is_current(country, generation));

        cache.resolve(country, vec![SelectOption::new("1", "USA")]);
        assert_eq!(cache.slot(country).status, FetchStatus::Resolved);
        assert_eq!(cache.options(country).len(), 1);
        assert!(!cache.any_fetching());
        assert!(!cache.is_current(country, generation));
    }

    #[test]
    fn test_options_cache_clear_invalidates() {
        let schema = schema();
        let mut cache = OptionsCache::new(&schema);
        let country = schema.field_id("country").unwrap();
        let first = cache.begin_fetch(country);
        cache.clear(country);
        assert!(!cache.is_current(country, first));
        let second = cache.begin_fetch(country);
        assert!(second > first);
        assert!(cache.is_current(country, second));
        cache.fail(country);
        assert_eq!(cache.slot(country).status, FetchStatus::Failed);
        assert!(cache.options(country).is_empty());
    }
}
