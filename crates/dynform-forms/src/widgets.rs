//! Widget system for rendering HTML form elements.
//!
//! Each widget knows how to render itself as HTML for a field name and its
//! current [`FieldValue`], how to turn raw input text back into a value, and
//! which `id` its `<label>` should target. [`create_widget`] picks the widget
//! for a field by matching its [`FieldType`].

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use dynform_core::utils::html::escape_html;

use crate::rules::parse_date;
use crate::schema::{FieldSpec, FieldType, SelectOption};
use crate::value::FieldValue;

/// Display format of the calendar picker.
pub const PICKER_FORMAT: &str = "%d/%m/%Y";

/// Enumerates all built-in widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="date">`.
    DateInput,
    /// Text input driven by a `DD/MM/YYYY` calendar picker.
    DatePicker,
    /// `<input type="file">`.
    FileInput,
    /// Searchable `<select>`.
    Autocomplete,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::DateInput => "DateInput",
            Self::DatePicker => "DatePicker",
            Self::FileInput => "FileInput",
            Self::Autocomplete => "Autocomplete",
        };
        write!(f, "{name}")
    }
}

/// A trait for HTML form widgets.
///
/// All widgets must be `Send + Sync` so a rendered form can be produced from
/// any task.
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget type enum variant.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget as an HTML string.
    ///
    /// # Arguments
    /// - `name` - The HTML `name` attribute
    /// - `value` - The field's current value
    /// - `attrs` - Additional HTML attributes
    fn render(&self, name: &str, value: &FieldValue, attrs: &HashMap<String, String>) -> String;

    /// Converts raw input text into a field value.
    ///
    /// Absent or blank input yields [`FieldValue::Null`].
    fn value_from_input(&self, raw: Option<&str>) -> FieldValue;

    /// Returns the HTML `id` attribute value for a label targeting this widget.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Formats an attributes map into a string like ` key="value" key2="value2"`.
///
/// Keys are sorted; values are HTML-escaped.
pub fn render_attrs(attrs: &HashMap<String, String>) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let mut parts: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect();
    parts.sort();
    parts.join("")
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Built-in widgets
// ---------------------------------------------------------------------------

/// A basic `<input type="text">` widget.
#[derive(Debug, Clone)]
pub struct TextInput;

impl Widget for TextInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::TextInput
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &HashMap<String, String>) -> String {
        let name = escape_html(name);
        let val = escape_html(&value.to_display_string());
        format!(
            r#"<input type="text" name="{name}" value="{val}"{} />"#,
            render_attrs(attrs)
        )
    }

    fn value_from_input(&self, raw: Option<&str>) -> FieldValue {
        // Text keeps surrounding whitespace; only absence means Null.
        raw.map_or(FieldValue::Null, FieldValue::from)
    }
}

/// A `<input type="number">` widget.
#[derive(Debug, Clone)]
pub struct NumberInput;

impl Widget for NumberInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::NumberInput
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &HashMap<String, String>) -> String {
        let name = escape_html(name);
        let val = escape_html(&value.to_display_string());
        format!(
            r#"<input type="number" name="{name}" value="{val}"{} />"#,
            render_attrs(attrs)
        )
    }

    fn value_from_input(&self, raw: Option<&str>) -> FieldValue {
        let Some(text) = non_blank(raw) else {
            return FieldValue::Null;
        };
        if let Ok(i) = text.parse::<i64>() {
            FieldValue::Int(i)
        } else if let Ok(f) = text.parse::<f64>() {
            FieldValue::Float(f)
        } else {
            // Left as text so the number rule reports the type error.
            FieldValue::from(text)
        }
    }
}

/// A `<input type="date">` widget using ISO `YYYY-MM-DD` values.
#[derive(Debug, Clone)]
pub struct DateInput;

impl Widget for DateInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::DateInput
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &HashMap<String, String>) -> String {
        let name = escape_html(name);
        let val = escape_html(&value.to_display_string());
        format!(
            r#"<input type="date" name="{name}" value="{val}"{} />"#,
            render_attrs(attrs)
        )
    }

    fn value_from_input(&self, raw: Option<&str>) -> FieldValue {
        non_blank(raw).map_or(FieldValue::Null, |text| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_or_else(|_| FieldValue::from(text), FieldValue::Date)
        })
    }
}

/// A calendar picker showing dates as `DD/MM/YYYY`.
#[derive(Debug, Clone)]
pub struct DatePicker;

impl DatePicker {
    fn display(value: &FieldValue) -> String {
        let date = match value {
            FieldValue::Date(d) => Some(*d),
            FieldValue::String(s) => parse_date(s),
            _ => None,
        };
        date.map_or_else(
            || value.to_display_string(),
            |d| d.format(PICKER_FORMAT).to_string(),
        )
    }
}

impl Widget for DatePicker {
    fn widget_type(&self) -> WidgetType {
        WidgetType::DatePicker
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &HashMap<String, String>) -> String {
        let name = escape_html(name);
        let val = escape_html(&Self::display(value));
        format!(
            r#"<input type="text" name="{name}" value="{val}" data-datepicker="DD/MM/YYYY" inputmode="numeric"{} />"#,
            render_attrs(attrs)
        )
    }

    fn value_from_input(&self, raw: Option<&str>) -> FieldValue {
        non_blank(raw).map_or(FieldValue::Null, |text| {
            NaiveDate::parse_from_str(text, PICKER_FORMAT)
                .map_or_else(|_| FieldValue::from(text), FieldValue::Date)
        })
    }
}

/// A file picker. Stores a [`FileHandle`](crate::value::FileHandle), never
/// file content.
#[derive(Debug, Clone)]
pub struct FileInput {
    /// The MIME filter placed in the `accept` attribute.
    pub accept: String,
}

impl FileInput {
    /// Creates a file input with the given MIME filter.
    pub fn new(accept: impl Into<String>) -> Self {
        Self {
            accept: accept.into(),
        }
    }
}

impl Widget for FileInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::FileInput
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &HashMap<String, String>) -> String {
        let name = escape_html(name);
        let mut html = String::new();
        if let Some(file) = value.as_file() {
            html.push_str(&format!(
                r#"<span class="file-current">Currently: {}</span> "#,
                escape_html(&file.name)
            ));
        }
        // File inputs never carry a value attribute.
        html.push_str(&format!(
            r#"<input type="file" name="{name}" accept="{}"{} />"#,
            escape_html(&self.accept),
            render_attrs(attrs)
        ));
        html
    }

    /// Chosen files arrive as handles through the controller; raw input can
    /// only clear the field.
    fn value_from_input(&self, _raw: Option<&str>) -> FieldValue {
        FieldValue::Null
    }
}

/// A searchable single select. The stored value is the option's `id`.
#[derive(Debug, Clone)]
pub struct Autocomplete {
    /// Candidates in display order.
    pub options: Vec<SelectOption>,
}

impl Autocomplete {
    /// Creates an autocomplete over the given candidates.
    pub const fn new(options: Vec<SelectOption>) -> Self {
        Self { options }
    }

    /// The option whose id matches `value`, if any.
    pub fn selected(&self, value: &FieldValue) -> Option<&SelectOption> {
        if value.is_null() {
            return None;
        }
        let current = value.to_display_string();
        self.options.iter().find(|o| o.id == current)
    }
}

impl Widget for Autocomplete {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Autocomplete
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &HashMap<String, String>) -> String {
        let name = escape_html(name);
        let selected_id = self.selected(value).map(|o| o.id.as_str());
        let mut options = String::from(r#"<option value=""></option>"#);
        for option in &self.options {
            let selected = if Some(option.id.as_str()) == selected_id {
                " selected"
            } else {
                ""
            };
            options.push_str(&format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                escape_html(&option.id),
                escape_html(&option.value)
            ));
        }
        format!(
            r#"<select name="{name}" data-searchable="true"{}>{options}</select>"#,
            render_attrs(attrs)
        )
    }

    fn value_from_input(&self, raw: Option<&str>) -> FieldValue {
        non_blank(raw).map_or(FieldValue::Null, FieldValue::from)
    }
}

/// Selects the widget for a field.
///
/// Autocomplete candidates come from the field's static options when it
/// declares them, otherwise from `resolved` (the options cache entry).
pub fn create_widget(field: &FieldSpec, resolved: &[SelectOption]) -> Box<dyn Widget> {
    match field.field_type {
        FieldType::Text | FieldType::Unknown => Box::new(TextInput),
        FieldType::Number => Box::new(NumberInput),
        FieldType::Date if field.date_picker => Box::new(DatePicker),
        FieldType::Date => Box::new(DateInput),
        FieldType::File => Box::new(FileInput::new(field.accept_or_default())),
        FieldType::Autocomplete => {
            let options = field
                .options
                .clone()
                .unwrap_or_else(|| resolved.to_vec());
            Box::new(Autocomplete::new(options))
        }
    }
}
