//! # dynform-forms
//!
//! Schema-driven forms. A [`FormSchema`] describes the fields; the
//! [`FormController`] owns their values, validates them with the rules the
//! schema declares, keeps remote option lists in sync through the
//! [`OptionResolver`], and renders each field with the widget its type
//! selects.
//!
//! ## Modules
//!
//! - [`schema`] - Field descriptors, layout, and form configuration
//! - [`schema_loader`] - JSON/TOML schema loading
//! - [`value`] - Field values and the submitted payload
//! - [`rules`] - Validation rule builder
//! - [`validation`] - Composite validator over all fields
//! - [`dependency`] - Parent/child graph of cascading fields
//! - [`state`] - Per-field value and option containers
//! - [`resolver`] - Remote option fetching and cascades
//! - [`widgets`] - HTML widgets, one per field type
//! - [`bound_field`] - Fields bound to their state for rendering
//! - [`form`] - The form controller and submit handlers

pub mod bound_field;
pub mod dependency;
pub mod form;
pub mod resolver;
pub mod rules;
pub mod schema;
pub mod schema_loader;
pub mod state;
pub mod validation;
pub mod value;
pub mod widgets;

pub use bound_field::BoundField;
pub use dependency::DependencyGraph;
pub use form::{
    FnSubmitHandler, FormController, LoggingSubmitHandler, SubmitAction, SubmitHandler,
    SubmitOutcome,
};
pub use resolver::{
    FetchOutcome, FetchRequest, HttpOptionSource, MemoryOptionSource, OptionResolver, OptionSource,
};
pub use rules::{Constraint, Pattern, Rule, RuleKind};
pub use schema::{
    sort_fields, Dependency, Dependent, FieldId, FieldSpec, FieldType, FormConfig, FormSchema,
    Layout, RemoteSource, SelectOption,
};
pub use state::{FetchStatus, FormState, OptionsCache};
pub use validation::{build_validator, CompositeValidator, ValidationReport};
pub use value::{FieldValue, FileHandle, FormValues};
pub use widgets::{create_widget, Widget, WidgetType};
