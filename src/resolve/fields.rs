//! Best-effort field extraction from loosely-typed content records.
//!
//! Field names in the content store have changed repeatedly ("title" vs
//! "guideTitle" vs "blogPostTitle"), so display code looks fields up by
//! intent keywords rather than exact names.

use serde_json::{Map, Value};

/// Find the first field whose lowercased name contains one of the intent
/// keywords.
///
/// Keywords are checked in priority order: for each keyword, every field
/// is scanned (in insertion order) before the next keyword is tried, so a
/// more specific keyword like "carddescription" wins over a generic
/// "description" when both are supplied. Keywords are expected lowercase.
pub fn find_field<'a>(record: &'a Map<String, Value>, keywords: &[&str]) -> Option<&'a Value> {
    for keyword in keywords {
        for (name, value) in record {
            if name.to_lowercase().contains(keyword) {
                return Some(value);
            }
        }
    }
    None
}

/// Extract a display string for the given intent keywords, falling back to
/// `default` when no field matches or the match flattens to nothing.
pub fn extract_text_field(
    record: &Map<String, Value>,
    keywords: &[&str],
    default: &str,
) -> String {
    let text = find_field(record, keywords)
        .map(extract_text)
        .unwrap_or_default();

    if text.is_empty() {
        default.to_string()
    } else {
        text
    }
}

/// Flatten a possibly rich-text value to plain text.
///
/// The content store has stored text fields as plain strings, as rich-text
/// node arrays (each node carrying `children[].text`), and as objects with
/// a `text` field. Anything else is JSON-stringified rather than dropped.
pub fn extract_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(nodes) => nodes
            .iter()
            .map(node_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                text.clone()
            } else {
                value.to_string()
            }
        }
        other => other.to_string(),
    }
}

/// Text of a single rich-text node
fn node_text(node: &Value) -> String {
    match node {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("children") {
            Some(Value::Array(children)) => children
                .iter()
                .filter_map(|c| c.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(""),
            _ => String::new(),
        },
        _ => String::new(),
    }
}
