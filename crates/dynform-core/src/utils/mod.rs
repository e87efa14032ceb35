//! Utility functions shared by the dynform crates.
//!
//! - [`html`]: escaping and class-list helpers used by widget rendering.

pub mod html;

pub use html::{class_list, escape_html};
