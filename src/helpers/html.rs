//! HTML helper functions

/// Escape text for use in HTML content and attribute values
///
/// # Examples
/// ```ignore
/// escape_html("<a href=\"x\">") // -> "&lt;a href=&quot;x&quot;&gt;"
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
