//! Plain-text rendering for the console.

use std::fmt::Write as _;
use std::io::{self, Write};

use serde_json::Value;

/// Shown for an empty resource list.
pub const NO_RESOURCES: &str = "No resources available.";

/// Shown for an empty capability map.
pub const NO_CAPABILITIES: &str = "No capabilities reported.";

/// Renders a value for display: strings bare, everything else as compact JSON.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One `- {resource}` line per resource, in order.
#[must_use]
pub fn format_resources<'a, I>(resources: I) -> String
where
    I: IntoIterator<Item = &'a Value>,
{
    let lines: Vec<String> = resources
        .into_iter()
        .map(|resource| format!("- {}", render_value(resource)))
        .collect();

    if lines.is_empty() {
        NO_RESOURCES.to_string()
    } else {
        lines.join("\n")
    }
}

/// One `key: value` line per capability.
#[must_use]
pub fn format_capabilities<'a, I>(capabilities: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut out = String::new();
    for (name, value) in capabilities {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "{name}: {}", render_value(value));
    }

    if out.is_empty() {
        NO_CAPABILITIES.to_string()
    } else {
        out
    }
}

/// Prints an error description for the user.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn report_error(out: &mut impl Write, error: &dyn std::error::Error) -> io::Result<()> {
    writeln!(out, "\nError: {error}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn resources_one_line_each_in_order() {
        let resources = vec![
            json!("file:///a.txt"),
            json!({"uri": "file:///b.txt"}),
            json!(42),
        ];
        let text = format_resources(&resources);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "- file:///a.txt",
                r#"- {"uri":"file:///b.txt"}"#,
                "- 42"
            ]
        );
    }

    #[test]
    fn empty_resources_render_literal() {
        assert_eq!(format_resources(&Vec::new()), NO_RESOURCES);
        assert_eq!(format_resources(std::iter::empty()), NO_RESOURCES);
    }

    #[test]
    fn capabilities_key_value_lines() {
        let mut caps = IndexMap::new();
        caps.insert("tools".to_string(), json!({"listChanged": false}));
        caps.insert("logging".to_string(), json!({}));
        caps.insert("vendor".to_string(), json!("acme"));

        assert_eq!(
            format_capabilities(&caps),
            "tools: {\"listChanged\":false}\nlogging: {}\nvendor: acme"
        );
    }

    #[test]
    fn empty_capabilities_render_literal() {
        let caps: IndexMap<String, Value> = IndexMap::new();
        assert_eq!(format_capabilities(&caps), NO_CAPABILITIES);
    }

    #[test]
    fn report_error_surrounds_description() {
        let mut out = Vec::new();
        let error = io::Error::other("boom");
        report_error(&mut out, &error).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\nError: boom\n\n");
    }
}
