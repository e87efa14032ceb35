//! Field validation rules.
//!
//! A [`Rule`] is a value kind plus an ordered list of [`Constraint`]s, each
//! pairing a predicate with the message shown when it fails. Rules are built
//! fluently:
//!
//! ```
//! use dynform_forms::rules::Rule;
//! use dynform_forms::value::FieldValue;
//!
//! let age = Rule::number()
//!     .required("Age is required")
//!     .positive("Age must be a positive number")
//!     .integer("Age must be an integer");
//!
//! assert!(age.validate(&FieldValue::Int(30)).is_ok());
//! assert_eq!(
//!     age.validate(&FieldValue::Int(-1)).unwrap_err().message,
//!     "Age must be a positive number"
//! );
//! ```
//!
//! Evaluation order:
//! 1. An empty value (`Null` or `""`) fails only `required`.
//! 2. The value is coerced to the rule's kind; failure yields the type error.
//! 3. Declarative constraints run in declaration order, then custom tests.
//!
//! The first failure wins.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use dynform_core::{FormError, FormResult, ValidationError};

use crate::value::FieldValue;

/// Date formats accepted by date rules, in the order they are tried.
pub const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// The kind of value a rule expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Text. Any other value is stringified; files by their name.
    String,
    /// A number. Numeric strings are parsed.
    Number,
    /// A calendar date, or a string in one of [`DATE_FORMATS`].
    Date,
    /// Anything, including file handles.
    Mixed,
}

impl RuleKind {
    const fn type_error(self) -> &'static str {
        match self {
            Self::String => "must be a `string` type",
            Self::Number => "must be a `number` type",
            Self::Date => "must be a `date` type",
            Self::Mixed => "is invalid",
        }
    }
}

/// A single declarative check inside a [`Rule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// The value must not be empty.
    Required { message: String },
    /// Number or date lower bound (dates compare as days since the epoch).
    Min { value: f64, message: String },
    /// Number or date upper bound.
    Max { value: f64, message: String },
    /// The number must be greater than zero.
    Positive { message: String },
    /// The number must have no fractional part.
    Integer { message: String },
    /// Minimum text length in characters.
    MinLength { value: usize, message: String },
    /// Maximum text length in characters.
    MaxLength { value: usize, message: String },
    /// The text must match a regular expression.
    Matches { pattern: Pattern, message: String },
    /// The displayed value must be one of the listed strings.
    OneOf { values: Vec<String>, message: String },
    /// A chosen file must not exceed the given size in bytes.
    MaxFileSize { bytes: u64, message: String },
    /// A chosen file's MIME type must be one of the listed types.
    FileTypes { types: Vec<String>, message: String },
}

impl Constraint {
    /// Returns the constraint's error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Required { .. } => "required",
            Self::Min { .. } => "min",
            Self::Max { .. } => "max",
            Self::Positive { .. } => "positive",
            Self::Integer { .. } => "integer",
            Self::MinLength { .. } => "min_length",
            Self::MaxLength { .. } => "max_length",
            Self::Matches { .. } => "matches",
            Self::OneOf { .. } => "one_of",
            Self::MaxFileSize { .. } => "max_file_size",
            Self::FileTypes { .. } => "file_types",
        }
    }

    /// Returns the message shown when the constraint fails.
    pub fn message(&self) -> &str {
        match self {
            Self::Required { message }
            | Self::Min { message, .. }
            | Self::Max { message, .. }
            | Self::Positive { message }
            | Self::Integer { message }
            | Self::MinLength { message, .. }
            | Self::MaxLength { message, .. }
            | Self::Matches { message, .. }
            | Self::OneOf { message, .. }
            | Self::MaxFileSize { message, .. }
            | Self::FileTypes { message, .. } => message,
        }
    }

    /// Whether this constraint can be attached to a rule of the given kind.
    pub const fn applies_to(&self, kind: RuleKind) -> bool {
        match self {
            Self::Required { .. } | Self::OneOf { .. } => true,
            Self::Min { .. } | Self::Max { .. } => {
                matches!(kind, RuleKind::Number | RuleKind::Date)
            }
            Self::Positive { .. } | Self::Integer { .. } => matches!(kind, RuleKind::Number),
            Self::MinLength { .. } | Self::MaxLength { .. } | Self::Matches { .. } => {
                matches!(kind, RuleKind::String)
            }
            Self::MaxFileSize { .. } | Self::FileTypes { .. } => matches!(kind, RuleKind::Mixed),
        }
    }

    /// Checks a coerced, non-empty value. Returns `true` if it passes.
    fn check(&self, coerced: &Coerced, raw: &FieldValue) -> bool {
        match (self, coerced) {
            (Self::Required { .. }, _) => true,
            (Self::Min { value, .. }, Coerced::Number(n)) => n >= value,
            (Self::Max { value, .. }, Coerced::Number(n)) => n <= value,
            (Self::Min { value, .. }, Coerced::Date(d)) => day_number(*d) >= *value,
            (Self::Max { value, .. }, Coerced::Date(d)) => day_number(*d) <= *value,
            (Self::Positive { .. }, Coerced::Number(n)) => *n > 0.0,
            (Self::Integer { .. }, Coerced::Number(n)) => n.fract() == 0.0,
            (Self::MinLength { value, .. }, Coerced::Text(s)) => s.chars().count() >= *value,
            (Self::MaxLength { value, .. }, Coerced::Text(s)) => s.chars().count() <= *value,
            (Self::Matches { pattern, .. }, Coerced::Text(s)) => pattern.is_match(s),
            (Self::OneOf { values, .. }, _) => {
                let shown = raw.to_display_string();
                values.iter().any(|v| *v == shown)
            }
            (Self::MaxFileSize { bytes, .. }, _) => raw.as_file().map_or(true, |f| f.size <= *bytes),
            (Self::FileTypes { types, .. }, _) => raw
                .as_file()
                .map_or(true, |f| types.iter().any(|t| *t == f.content_type)),
            _ => true,
        }
    }

    /// The error raised when this constraint fails, with its bound attached.
    fn error(&self) -> ValidationError {
        let err = ValidationError::new(self.message(), self.code());
        match self {
            Self::Min { value, .. } | Self::Max { value, .. } => {
                err.with_param("limit", value.to_string())
            }
            Self::MinLength { value, .. } | Self::MaxLength { value, .. } => {
                err.with_param("limit", value.to_string())
            }
            Self::Matches { pattern, .. } => err.with_param("pattern", pattern.as_str()),
            Self::OneOf { values, .. } => err.with_param("values", values.join(", ")),
            Self::MaxFileSize { bytes, .. } => err.with_param("limit", bytes.to_string()),
            Self::FileTypes { types, .. } => err.with_param("types", types.join(", ")),
            Self::Required { .. } | Self::Positive { .. } | Self::Integer { .. } => err,
        }
    }
}

/// A `matches` pattern, compiled once when the rule is built or loaded.
///
/// An invalid pattern is kept so [`Rule::check_consistency`] can report it;
/// it never matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Pattern {
    source: String,
    compiled: Result<Regex, regex::Error>,
}

impl Pattern {
    /// Compiles `source`.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source);
        Self { source, compiled }
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compile error, if the pattern is invalid.
    pub fn error(&self) -> Option<&regex::Error> {
        self.compiled.as_ref().err()
    }

    /// Whether `text` matches. Invalid patterns match nothing.
    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.as_ref().is_ok_and(|re| re.is_match(text))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since 1970-01-01, the scale used by date `min`/`max` bounds.
pub fn day_number(d: NaiveDate) -> f64 {
    f64::from(d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

/// A programmatic check that is not serialized with the rule.
#[derive(Clone)]
pub struct CustomTest {
    /// Error code reported on failure.
    pub name: String,
    /// Message shown on failure.
    pub message: String,
    predicate: Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>,
}

impl fmt::Debug for CustomTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTest")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A field's validation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// The expected value kind.
    pub kind: RuleKind,
    /// Declarative constraints, checked in order.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Message used when the value cannot be coerced to `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_error: Option<String>,
    #[serde(skip)]
    tests: Vec<CustomTest>,
}

impl Default for Rule {
    /// The rule applied to fields that declare none: any string is valid.
    fn default() -> Self {
        Self::string()
    }
}

impl Rule {
    fn of_kind(kind: RuleKind) -> Self {
        Self {
            kind,
            constraints: Vec::new(),
            type_error: None,
            tests: Vec::new(),
        }
    }

    /// A text rule with no constraints.
    pub fn string() -> Self {
        Self::of_kind(RuleKind::String)
    }

    /// A number rule with no constraints.
    pub fn number() -> Self {
        Self::of_kind(RuleKind::Number)
    }

    /// A date rule with no constraints.
    pub fn date() -> Self {
        Self::of_kind(RuleKind::Date)
    }

    /// A rule accepting any value, typically used for files.
    pub fn mixed() -> Self {
        Self::of_kind(RuleKind::Mixed)
    }

    fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Requires a non-empty value.
    #[must_use]
    pub fn required(self, message: impl Into<String>) -> Self {
        self.with(Constraint::Required {
            message: message.into(),
        })
    }

    /// Lower bound for numbers (or dates, as days since 1970-01-01).
    #[must_use]
    pub fn min(self, value: f64, message: impl Into<String>) -> Self {
        self.with(Constraint::Min {
            value,
            message: message.into(),
        })
    }

    /// Upper bound for numbers (or dates, as days since 1970-01-01).
    #[must_use]
    pub fn max(self, value: f64, message: impl Into<String>) -> Self {
        self.with(Constraint::Max {
            value,
            message: message.into(),
        })
    }

    /// Requires a number greater than zero.
    #[must_use]
    pub fn positive(self, message: impl Into<String>) -> Self {
        self.with(Constraint::Positive {
            message: message.into(),
        })
    }

    /// Requires a whole number.
    #[must_use]
    pub fn integer(self, message: impl Into<String>) -> Self {
        self.with(Constraint::Integer {
            message: message.into(),
        })
    }

    /// Minimum text length in characters.
    #[must_use]
    pub fn min_length(self, value: usize, message: impl Into<String>) -> Self {
        self.with(Constraint::MinLength {
            value,
            message: message.into(),
        })
    }

    /// Maximum text length in characters.
    #[must_use]
    pub fn max_length(self, value: usize, message: impl Into<String>) -> Self {
        self.with(Constraint::MaxLength {
            value,
            message: message.into(),
        })
    }

    /// Requires the text to match `pattern`.
    #[must_use]
    pub fn matches(self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.with(Constraint::Matches {
            pattern: Pattern::new(pattern),
            message: message.into(),
        })
    }

    /// Restricts the value to a fixed set.
    #[must_use]
    pub fn one_of<I, S>(self, values: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Constraint::OneOf {
            values: values.into_iter().map(Into::into).collect(),
            message: message.into(),
        })
    }

    /// Maximum file size in bytes.
    #[must_use]
    pub fn max_file_size(self, bytes: u64, message: impl Into<String>) -> Self {
        self.with(Constraint::MaxFileSize {
            bytes,
            message: message.into(),
        })
    }

    /// Allowed MIME types for a chosen file.
    #[must_use]
    pub fn file_types<I, S>(self, types: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Constraint::FileTypes {
            types: types.into_iter().map(Into::into).collect(),
            message: message.into(),
        })
    }

    /// Overrides the coercion failure message.
    #[must_use]
    pub fn type_error(mut self, message: impl Into<String>) -> Self {
        self.type_error = Some(message.into());
        self
    }

    /// Adds a custom check, run after the declarative constraints.
    ///
    /// Like every constraint except `required`, the predicate is only called
    /// for non-empty values.
    #[must_use]
    pub fn test<F>(mut self, name: impl Into<String>, message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&FieldValue) -> bool + Send + Sync + 'static,
    {
        self.tests.push(CustomTest {
            name: name.into(),
            message: message.into(),
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Returns `true` if the rule has a `required` constraint.
    pub fn is_required(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::Required { .. }))
    }

    /// Returns the custom tests attached to this rule.
    pub fn tests(&self) -> &[CustomTest] {
        &self.tests
    }

    /// Checks that every constraint fits the rule's kind and every pattern
    /// compiles.
    pub fn check_consistency(&self) -> FormResult<()> {
        for constraint in &self.constraints {
            if !constraint.applies_to(self.kind) {
                return Err(FormError::ImproperlyConfigured(format!(
                    "constraint '{}' cannot be used in a {:?} rule",
                    constraint.code(),
                    self.kind
                )));
            }
            if let Constraint::Matches { pattern, .. } = constraint {
                if let Some(e) = pattern.error() {
                    return Err(FormError::ImproperlyConfigured(format!(
                        "invalid pattern '{}': {e}",
                        pattern.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validates one value against this rule.
    pub fn validate(&self, value: &FieldValue) -> Result<(), ValidationError> {
        if value.is_empty() {
            return match self
                .constraints
                .iter()
                .find(|c| matches!(c, Constraint::Required { .. }))
            {
                Some(required) => Err(ValidationError::new(required.message(), required.code())),
                None => Ok(()),
            };
        }

        let coerced = self.coerce(value).ok_or_else(|| {
            let message = self
                .type_error
                .clone()
                .unwrap_or_else(|| self.kind.type_error().to_string());
            ValidationError::new(message, "type")
        })?;

        if let Some(failed) = self.constraints.iter().find(|c| !c.check(&coerced, value)) {
            return Err(failed.error());
        }

        if let Some(failed) = self.tests.iter().find(|t| !(t.predicate)(value)) {
            return Err(ValidationError::new(failed.message.clone(), failed.name.clone()));
        }

        Ok(())
    }

    fn coerce(&self, value: &FieldValue) -> Option<Coerced> {
        match self.kind {
            RuleKind::String => Some(Coerced::Text(value.to_display_string())),
            RuleKind::Number => match value {
                FieldValue::Int(i) => Some(Coerced::Number(*i as f64)),
                FieldValue::Float(f) if f.is_finite() => Some(Coerced::Number(*f)),
                FieldValue::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Coerced::Number),
                _ => None,
            },
            RuleKind::Date => match value {
                FieldValue::Date(d) => Some(Coerced::Date(*d)),
                FieldValue::String(s) => parse_date(s).map(Coerced::Date),
                _ => None,
            },
            RuleKind::Mixed => Some(Coerced::Any),
        }
    }
}

/// Parses a date in any of the accepted [`DATE_FORMATS`].
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// A value after coercion to a rule's kind.
enum Coerced {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Any,
}
