//! # dynform
//!
//! Schema-driven HTML forms for Rust.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `dynform` to get everything, or on the individual
//! crates for finer-grained control.
//!
//! ```
//! use dynform::prelude::*;
//!
//! let schema = FormSchema::new(vec![
//!     FieldSpec::new("firstName", "First name", FieldType::Text, 1)
//!         .layout(Layout::half())
//!         .rule(Rule::string().required("First name is required")),
//! ]);
//! let form = FormController::new(schema, MemoryOptionSource::new(), LoggingSubmitHandler)
//!     .unwrap();
//! assert!(form.render().contains(r#"name="firstName""#));
//! ```

/// Error types, settings, logging, and HTML helpers.
pub use dynform_core as core;

/// Schema, rules, widgets, option resolver, and form controller.
#[cfg(feature = "forms")]
pub use dynform_forms as forms;

// Third-party re-exports
pub use async_trait::async_trait;
pub use serde_json;
pub use tracing;

/// Commonly used types.
pub mod prelude {
    pub use dynform_core::logging::setup_logging;
    pub use dynform_core::{FetchError, FormError, FormResult, Settings, ValidationError};

    #[cfg(feature = "forms")]
    pub use dynform_forms::{
        FieldSpec, FieldType, FieldValue, FileHandle, FormController, FormSchema, FormValues,
        HttpOptionSource, Layout, LoggingSubmitHandler, MemoryOptionSource, OptionSource, Rule,
        SelectOption, SubmitAction, SubmitHandler, SubmitOutcome,
    };
}
