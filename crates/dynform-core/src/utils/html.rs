//! HTML helpers for widget rendering.

/// Escapes HTML special characters in a string.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their HTML entity equivalents.
///
/// # Examples
///
/// ```
/// use dynform_core::utils::html::escape_html;
///
/// assert_eq!(escape_html("<b>\"Ana\"</b>"), "&lt;b&gt;&quot;Ana&quot;&lt;/b&gt;");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Joins non-empty class names with single spaces.
///
/// # Examples
///
/// ```
/// use dynform_core::utils::html::class_list;
///
/// assert_eq!(class_list(&["field", "", "field-error"]), "field field-error");
/// ```
pub fn class_list(classes: &[&str]) -> String {
    classes
        .iter()
        .filter(|c| !c.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
