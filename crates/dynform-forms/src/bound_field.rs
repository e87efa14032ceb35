//! Bound fields: a field spec paired with its current state.
//!
//! A [`BoundField`] combines a [`FieldSpec`], the field's current value and
//! validation error, and the widget chosen for it. It renders one grid item:
//! a bold label, the widget, and the helper text carrying the error message.

use std::collections::HashMap;

use dynform_core::utils::html::{class_list, escape_html};
use dynform_core::ValidationError;

use crate::rules::Rule;
use crate::schema::{FieldSpec, Layout, SelectOption};
use crate::value::FieldValue;
use crate::widgets::{self, Widget};

/// A form field bound to its value and validation state.
#[derive(Debug)]
pub struct BoundField {
    /// The field's HTML name attribute.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Placeholder text.
    pub placeholder: Option<String>,
    /// Size variant.
    pub size: String,
    /// Grid breakpoints.
    pub layout: Layout,
    /// Whether the field's rule requires a value.
    pub required: bool,
    /// The current value.
    pub value: FieldValue,
    /// The current validation error.
    pub error: Option<ValidationError>,
    /// Whether remote options for this field are still loading.
    pub loading: bool,
    /// The widget instance used for rendering.
    pub widget: Box<dyn Widget>,
}

impl BoundField {
    /// Binds a field to its state. `options` is the field's cache entry.
    pub fn new(
        field: &FieldSpec,
        value: FieldValue,
        error: Option<ValidationError>,
        options: &[SelectOption],
        loading: bool,
    ) -> Self {
        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            placeholder: field.placeholder.clone(),
            size: field.size_or_default().to_string(),
            layout: field.layout.unwrap_or_else(Layout::full),
            required: field.rule.as_ref().is_some_and(Rule::is_required),
            value,
            error,
            loading,
            widget: widgets::create_widget(field, options),
        }
    }

    /// Returns the auto-generated HTML `id` for this field.
    pub fn auto_id(&self) -> String {
        format!("id_{}", self.name)
    }

    /// Whether the field currently has an error.
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The error message, or the empty string when valid.
    pub fn helper_text(&self) -> &str {
        self.error.as_ref().map_or("", |e| e.message.as_str())
    }

    /// Grid classes for the five breakpoints, e.g. `grid-item xs-12 md-6`.
    pub fn grid_classes(&self) -> String {
        let mut classes = vec!["grid-item".to_string()];
        classes.extend(
            self.layout
                .breakpoints()
                .iter()
                .map(|(name, value)| format!("{name}-{value}")),
        );
        classes.join(" ")
    }

    /// Renders the widget HTML for this bound field.
    pub fn render(&self, extra_attrs: &HashMap<String, String>) -> String {
        let mut attrs = extra_attrs.clone();
        attrs.entry("id".to_string()).or_insert_with(|| self.auto_id());

        let size_class = format!("field-{}", self.size);
        let error_class = if self.has_error() { "field-error" } else { "" };
        attrs.insert(
            "class".to_string(),
            class_list(&["field", size_class.as_str(), error_class]),
        );
        if let Some(placeholder) = &self.placeholder {
            attrs.insert("placeholder".to_string(), placeholder.clone());
        }
        if self.required {
            attrs.insert("aria-required".to_string(), "true".to_string());
        }
        if self.has_error() {
            attrs.insert("aria-invalid".to_string(), "true".to_string());
            attrs.insert("aria-describedby".to_string(), self.helper_id());
        }
        if self.loading {
            attrs.insert("aria-busy".to_string(), "true".to_string());
        }
        self.widget.render(&self.name, &self.value, &attrs)
    }

    /// Renders a bold `<label>` element for this field.
    pub fn label_tag(&self) -> String {
        let label_id = escape_html(&self.widget.id_for_label(&self.auto_id()));
        format!(
            r#"<label for="{label_id}"><strong>{}</strong></label>"#,
            escape_html(&self.label)
        )
    }

    /// Renders the helper text paragraph, empty when the field is valid.
    pub fn helper_text_tag(&self) -> String {
        match &self.error {
            Some(error) => format!(
                r#"<p id="{}" class="helper-text error">{}</p>"#,
                escape_html(&self.helper_id()),
                escape_html(&error.message)
            ),
            None => String::new(),
        }
    }

    /// Renders the complete grid item: label, widget, helper text.
    pub fn as_grid_item(&self) -> String {
        format!(
            r#"<div class="{}">{}{}{}</div>"#,
            self.grid_classes(),
            self.label_tag(),
            self.render(&HashMap::new()),
            self.helper_text_tag()
        )
    }

    fn helper_id(&self) -> String {
        format!("{}_helper", self.auto_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use crate::widgets::WidgetType;

    fn age_field() -> FieldSpec {
        FieldSpec::new("age", "Age", FieldType::Number, 2)
            .layout(Layout::half())
            .placeholder("Your age")
            .rule(Rule::number().required("Age is required"))
    }

    #[test]
    fn test_bound_field_basic() {
        let bf = BoundField::new(&age_field(), FieldValue::Int(30), None, &[], false);
        assert_eq!(bf.auto_id(), "id_age");
        assert!(bf.required);
        assert!(!bf.has_error());
        assert_eq!(bf.helper_text(), "");
        assert_eq!(bf.size, "medium");
        assert_eq!(bf.widget.widget_type(), WidgetType::NumberInput);
    }

    #[test]
    fn test_render_valid() {
        let bf = BoundField::new(&age_field(), FieldValue::Int(30), None, &[], false);
        let html = bf.render(&HashMap::new());
        assert_eq!(
            html,
            r#"<input type="number" name="age" value="30" aria-required="true" class="field field-medium" id="id_age" placeholder="Your age" />"#
        );
    }

    #[test]
    fn test_render_error() {
        let error = ValidationError::new("Age is required", "required");
        let bf = BoundField::new(&age_field(), FieldValue::Null, Some(error), &[], false);
        assert!(bf.has_error());
        assert_eq!(bf.helper_text(), "Age is required");
        let html = bf.render(&HashMap::new());
        assert!(html.contains(r#"class="field field-medium field-error""#));
        assert!(html.contains(r#"aria-invalid="true""#));
        assert!(html.contains(r#"aria-describedby="id_age_helper""#));
        assert_eq!(
            bf.helper_text_tag(),
            r#"<p id="id_age_helper" class="helper-text error">Age is required</p>"#
        );
    }

    #[test]
    fn test_label_tag_bold_and_escaped() {
        let field = FieldSpec::new("tos", "Terms & <Conditions>", FieldType::Text, 1)
            .layout(Layout::full());
        let bf = BoundField::new(&field, FieldValue::Null, None, &[], false);
        assert_eq!(
            bf.label_tag(),
            r#"<label for="id_tos"><strong>Terms &amp; &lt;Conditions&gt;</strong></label>"#
        );
    }

    #[test]
    fn test_quoted_name_stays_inside_attributes() {
        let field = FieldSpec::new(r#"x" onclick="y"#, "X", FieldType::Text, 1)
            .layout(Layout::full());
        let error = ValidationError::new("Bad", "type");
        let bf = BoundField::new(&field, FieldValue::Null, Some(error), &[], false);
        let html = bf.as_grid_item();
        assert!(!html.contains(r#"" onclick=""#));
        assert!(bf.label_tag().contains(r#"for="id_x&quot; onclick=&quot;y""#));
        assert!(bf
            .helper_text_tag()
            .contains(r#"id="id_x&quot; onclick=&quot;y_helper""#));
    }

    #[test]
    fn test_grid_item() {
        let bf = BoundField::new(&age_field(), FieldValue::Null, None, &[], false);
        assert_eq!(bf.grid_classes(), "grid-item xs-12 sm-12 md-6 lg-6 xl-6");
        let html = bf.as_grid_item();
        assert!(html.starts_with(r#"<div class="grid-item xs-12 sm-12 md-6 lg-6 xl-6"><label"#));
        assert!(html.ends_with("/></div>"));
    }

    #[test]
    fn test_loading_marks_busy() {
        let field = FieldSpec::new("country", "Country", FieldType::Autocomplete, 1)
            .layout(Layout::full())
            .size("small");
        let bf = BoundField::new(&field, FieldValue::Null, None, &[], true);
        let html = bf.render(&HashMap::new());
        assert!(html.contains(r#"aria-busy="true""#));
        assert!(html.contains("field-small"));
    }
}
