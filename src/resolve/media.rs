//! Media URL resolution.
//!
//! Media references come back from the content API in several shapes: a
//! plain object, an object wrapped in `attributes`, a `{data: ...}`
//! envelope holding either, or an array of any of those. This module
//! flattens all of them and picks the best available rendition URL.

use serde_json::{Map, Value};

/// Named formats in preference order, largest first
const FORMAT_PREFERENCE: &[&str] = &["large", "medium", "small", "thumbnail"];

/// Resolve a media reference to an absolute URL.
///
/// Returns an empty string when no node in the structure carries a usable
/// `url`, `src`, or format entry. Relative paths are prefixed with
/// `base_url` with exactly one slash between. Never errors.
pub fn resolve_media_url(value: &Value, base_url: &str) -> String {
    let mut nodes = Vec::new();
    collect_nodes(value, &mut nodes);

    for node in nodes {
        if let Some(candidate) = pick_url(node) {
            return absolutize(&candidate, base_url);
        }
    }

    String::new()
}

/// Recursively unwrap arrays, `data` envelopes, and `attributes`
/// envelopes down to candidate media nodes
fn collect_nodes<'a>(value: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_nodes(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(data) = map.get("data") {
                match data {
                    Value::Array(items) => {
                        for item in items {
                            collect_nodes(item, out);
                        }
                    }
                    Value::Object(inner) => match inner.get("attributes") {
                        Some(attrs) => collect_nodes(attrs, out),
                        None => collect_nodes(data, out),
                    },
                    _ => {}
                }
            } else if let Some(Value::Object(attrs)) = map.get("attributes") {
                out.push(attrs);
            } else {
                out.push(map);
            }
        }
        _ => {}
    }
}

/// Pick the best URL from a single media node: direct `url`, direct `src`,
/// then largest-to-smallest named format, then any other format
fn pick_url(node: &Map<String, Value>) -> Option<String> {
    if let Some(url) = non_empty_str(node.get("url")) {
        return Some(url);
    }
    if let Some(src) = non_empty_str(node.get("src")) {
        return Some(src);
    }

    let formats = node.get("formats").and_then(Value::as_object)?;

    for name in FORMAT_PREFERENCE {
        if let Some(url) = non_empty_str(formats.get(*name).and_then(|f| f.get("url"))) {
            return Some(url);
        }
    }

    // Any remaining format the store happens to have
    formats
        .values()
        .find_map(|f| non_empty_str(f.get("url")))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Prefix relative paths with the base URL, one slash between
fn absolutize(candidate: &str, base_url: &str) -> String {
    if candidate.starts_with("http") {
        return candidate.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if candidate.starts_with('/') {
        format!("{}{}", base, candidate)
    } else {
        format!("{}/{}", base, candidate)
    }
}
