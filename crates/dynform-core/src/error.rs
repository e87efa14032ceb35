//! Core error types for dynform.
//!
//! [`FormError`] covers schema configuration defects, remote option fetch
//! failures, submission failures, and serialization/IO problems. Validation
//! failures are not errors at this level: they are per-field
//! [`ValidationError`] values stored in form state. Configuration defects are
//! reported when a form is constructed.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A single validation failure produced by a field rule.
///
/// The `message` is what a widget shows as its helper text; the `code`
/// identifies which constraint failed (e.g. "required", "positive").
///
/// # Examples
///
/// ```
/// use dynform_core::error::ValidationError;
///
/// let err = ValidationError::new("Age is required", "required");
/// assert_eq!(err.to_string(), "Age is required");
///
/// let err = ValidationError::new("File is too large", "max_file_size")
///     .with_param("limit", "5242880");
/// assert_eq!(err.params["limit"], "5242880");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The message surfaced to the user.
    pub message: String,
    /// A short code identifying the failed constraint.
    pub code: String,
    /// Additional parameters giving context for the message.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Failure of a remote option fetch.
///
/// All variants are non-fatal: the affected field keeps an empty option list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-2xx status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The response body was not a list of `{id, value}` options.
    #[error("malformed options payload: {0}")]
    Malformed(String),
}

/// The primary error type for dynform.
#[derive(Error, Debug)]
pub enum FormError {
    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value (settings file, env) is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The form schema is malformed (duplicate names, bad layout, broken
    /// dependency declarations).
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// A field name does not exist in the schema.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    // ── Remote options ───────────────────────────────────────────────

    /// A remote option fetch failed.
    #[error("Fetch error for '{url}': {source}")]
    Fetch {
        /// The requested URL.
        url: String,
        /// The underlying failure.
        #[source]
        source: FetchError,
    },

    // ── Submission ───────────────────────────────────────────────────

    /// The submit collaborator rejected the payload.
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// Reading a settings or schema file failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormError {
    /// Returns `true` for errors caused by a defective schema or settings.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError(_) | Self::ImproperlyConfigured(_) | Self::UnknownField(_)
        )
    }
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormError>`.
pub type FormResult<T> = Result<T, FormError>;
