//! Collection probing.
//!
//! The content store's collections have been renamed over the project's
//! history, so lookups sweep an ordered list of candidate names. Within a
//! collection, strategies run in a fixed order: slug-field filters first
//! (so numeric-looking slugs still work), then a direct by-id lookup for
//! numeric identifiers, then a collection query filtered by id. The first
//! non-empty result anywhere ends the sweep.
//!
//! Failed attempts, including whole-collection 404s, are logged and
//! skipped; only exhaustion of every candidate becomes a not-found.

use serde_json::Value;

use super::record::{normalize, NormalizedRecord};
use crate::adapters::{ContentApi, UpstreamError};

/// Result of a connectivity probe: the first collection that answered,
/// with its reported total
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub collection: String,
    pub total: u64,
}

/// Sweeps collection candidates against the content API
pub struct Prober<A> {
    api: A,
    slug_fields: Vec<String>,
}

impl<A: ContentApi> Prober<A> {
    pub fn new(api: A, slug_fields: Vec<String>) -> Self {
        Self { api, slug_fields }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Locate a record by numeric id or slug across the candidate
    /// collections. Returns `None` after exhausting every candidate.
    pub async fn find_record(
        &self,
        identifier: &str,
        collections: &[String],
    ) -> Option<NormalizedRecord> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return None;
        }

        let is_numeric = identifier.chars().all(|c| c.is_ascii_digit());

        for collection in collections {
            // Slug matches first so numeric-looking slugs still work
            for field in &self.slug_fields {
                match self.api.filter_eq(collection, field, identifier).await {
                    Ok(body) => {
                        if let Some(record) = first_item(&body).and_then(normalize) {
                            tracing::debug!("Matched {} by slug filter on {}", collection, field);
                            return Some(record);
                        }
                    }
                    Err(e) => log_skip(collection, "slug filter", &e),
                }
            }

            if is_numeric {
                match self.api.get_by_id(collection, identifier).await {
                    Ok(body) => {
                        if let Some(record) = body.get("data").and_then(normalize) {
                            tracing::debug!("Matched {} by direct id lookup", collection);
                            return Some(record);
                        }
                    }
                    Err(e) => log_skip(collection, "by-id lookup", &e),
                }
            }

            // Works even when the store only grants the find permission
            match self.api.filter_eq(collection, "id", identifier).await {
                Ok(body) => {
                    if let Some(record) = first_item(&body).and_then(normalize) {
                        tracing::debug!("Matched {} by id filter", collection);
                        return Some(record);
                    }
                }
                Err(e) => log_skip(collection, "id filter", &e),
            }
        }

        None
    }

    /// List the first collection that answers a plain list query,
    /// normalized. Empty when no candidate answers.
    pub async fn list_records(&self, collections: &[String]) -> Vec<NormalizedRecord> {
        for collection in collections {
            match self.api.list(collection).await {
                Ok(body) => {
                    let items = body
                        .get("data")
                        .and_then(Value::as_array)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    tracing::debug!("Listed {} items from {}", items.len(), collection);
                    return items.iter().filter_map(normalize).collect();
                }
                Err(e) => log_skip(collection, "list", &e),
            }
        }

        Vec::new()
    }

    /// Connectivity probe: report the first collection that answers a
    /// count query, with `meta.pagination.total` (falling back to the
    /// returned page length).
    pub async fn probe_collections(&self, collections: &[String]) -> Option<ProbeReport> {
        for collection in collections {
            match self.api.count(collection).await {
                Ok(body) => {
                    let total = body
                        .pointer("/meta/pagination/total")
                        .and_then(Value::as_u64)
                        .or_else(|| {
                            body.get("data")
                                .and_then(Value::as_array)
                                .map(|a| a.len() as u64)
                        })
                        .unwrap_or(0);
                    return Some(ProbeReport {
                        collection: collection.clone(),
                        total,
                    });
                }
                Err(e) => log_skip(collection, "count", &e),
            }
        }

        None
    }
}

/// First element of the response's `data` array
fn first_item(body: &Value) -> Option<&Value> {
    body.get("data").and_then(Value::as_array)?.first()
}

fn log_skip(collection: &str, attempt: &str, err: &UpstreamError) {
    if err.is_not_found() {
        tracing::debug!("Collection {} not found ({}), continuing", collection, attempt);
    } else {
        tracing::warn!("Lookup failed for {} ({}): {}, continuing", collection, attempt, err);
    }
}
