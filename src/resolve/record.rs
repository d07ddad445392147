//! Record normalization.
//!
//! The content API serves records in two shapes: a flat map of fields, or
//! a nested envelope with the fields under `attributes`. Normalization
//! flattens either shape and derives a stable slug so the rest of the
//! crate never touches the envelope.

use serde::Serialize;
use serde_json::{Map, Value};

use super::fields;

/// A content record flattened to a single map, with `id` and `slug`
/// guaranteed present and non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedRecord {
    fields: Map<String, Value>,
}

impl NormalizedRecord {
    pub fn id(&self) -> &str {
        self.fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn slug(&self) -> &str {
        self.fields
            .get("slug")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All fields, including `id` and `slug`
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Best-effort field lookup by intent keywords (see [`fields::find_field`])
    pub fn extract(&self, keywords: &[&str], default: &str) -> String {
        fields::extract_text_field(&self.fields, keywords, default)
    }
}

/// Coerce a scalar field to a non-empty string, if possible
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Slug candidates checked in order when no explicit slug is present
const SLUG_FIELDS: &[&str] = &["slug", "uid", "handle", "permalink"];

/// Normalize a raw content-store item.
///
/// Envelope shape (`attributes` present): `{id}` is merged with the
/// attributes map. Flat shape: used as-is, with `id` coerced to a string
/// (falling back to `slug` then `uid` when the store omits `id`). Returns
/// `None` for non-objects and for records with no usable identifier.
///
/// Idempotent: normalizing an already-normalized record re-derives the
/// same id and slug.
pub fn normalize(raw: &Value) -> Option<NormalizedRecord> {
    let item = raw.as_object()?;

    let attrs = item.get("attributes").and_then(Value::as_object);

    let (mut fields, id) = match attrs {
        Some(attrs) => {
            let id = item.get("id").and_then(value_to_string)?;
            let mut fields = attrs.clone();
            fields.insert("id".to_string(), Value::String(id.clone()));
            (fields, id)
        }
        None => {
            let id = item
                .get("id")
                .and_then(value_to_string)
                .or_else(|| item.get("slug").and_then(value_to_string))
                .or_else(|| item.get("uid").and_then(value_to_string))?;
            let mut fields = item.clone();
            fields.insert("id".to_string(), Value::String(id.clone()));
            (fields, id)
        }
    };

    let slug = derive_slug(&fields, attrs).unwrap_or(id);
    fields.insert("slug".to_string(), Value::String(slug));

    Some(NormalizedRecord { fields })
}

/// First non-empty slug candidate from the flattened fields or the
/// original attributes map
fn derive_slug(fields: &Map<String, Value>, attrs: Option<&Map<String, Value>>) -> Option<String> {
    for name in SLUG_FIELDS {
        let candidate = fields
            .get(*name)
            .and_then(value_to_string)
            .or_else(|| attrs.and_then(|a| a.get(*name)).and_then(value_to_string));
        if candidate.is_some() {
            return candidate;
        }
    }
    None
}
