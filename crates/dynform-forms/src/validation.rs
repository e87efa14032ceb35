//! Composite validation over a whole form.
//!
//! [`build_validator`] maps every field to its declared [`Rule`], or to the
//! default "any string" rule when it declares none. Running the resulting
//! [`CompositeValidator`] checks each field independently; errors accumulate
//! rather than short-circuiting, so all failures are reported at once.

use std::collections::BTreeMap;

use dynform_core::ValidationError;

use crate::rules::Rule;
use crate::schema::FieldSpec;
use crate::value::{FieldValue, FormValues};

/// Per-field outcome of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    results: BTreeMap<String, Option<ValidationError>>,
}

impl ValidationReport {
    /// Returns `true` when no field failed.
    pub fn is_valid(&self) -> bool {
        self.results.values().all(Option::is_none)
    }

    /// The error for one field, if it failed.
    pub fn error(&self, name: &str) -> Option<&ValidationError> {
        self.results.get(name).and_then(Option::as_ref)
    }

    /// Every field's outcome keyed by name; `None` means valid.
    pub const fn results(&self) -> &BTreeMap<String, Option<ValidationError>> {
        &self.results
    }

    /// Only the failures, keyed by field name.
    pub fn errors(&self) -> BTreeMap<String, ValidationError> {
        self.results
            .iter()
            .filter_map(|(name, result)| result.clone().map(|e| (name.clone(), e)))
            .collect()
    }

    /// Number of failing fields.
    pub fn error_count(&self) -> usize {
        self.results.values().filter(|r| r.is_some()).count()
    }
}

/// All per-field rules of a form, evaluated together.
#[derive(Debug, Clone, Default)]
pub struct CompositeValidator {
    rules: Vec<(String, Rule)>,
}

impl CompositeValidator {
    /// The rule a field is checked against.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Validates a single field; unknown names are valid.
    pub fn validate_field(&self, name: &str, value: &FieldValue) -> Option<ValidationError> {
        self.rule(name).and_then(|rule| rule.validate(value).err())
    }

    /// Validates every field. Missing values are treated as `Null`.
    pub fn validate(&self, values: &FormValues) -> ValidationReport {
        let results = self
            .rules
            .iter()
            .map(|(name, rule)| {
                let value = values.get(name).unwrap_or(&FieldValue::Null);
                (name.clone(), rule.validate(value).err())
            })
            .collect();
        ValidationReport { results }
    }
}

/// Builds the composite validator for a field sequence.
pub fn build_validator(fields: &[FieldSpec]) -> CompositeValidator {
    let rules = fields
        .iter()
        .map(|field| (field.name.clone(), field.rule.clone().unwrap_or_default()))
        .collect();
    CompositeValidator { rules }
}
