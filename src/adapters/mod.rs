//! External system integrations (content API, newsletter provider).

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod beehiiv;
mod strapi;

pub use beehiiv::BeehiivClient;
pub use strapi::StrapiClient;

/// Errors from the content API.
///
/// These never escalate past the probing loop; the prober logs them and
/// moves on to the next candidate.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Non-2xx response
    #[error("content API returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Network-level failure
    #[error("request to content API failed: {0}")]
    Transport(String),

    /// Response body was not the expected JSON
    #[error("content API response was not valid JSON: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Whole-collection 404s are expected while probing renamed
    /// collections and are skipped without a warning.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::Status { status: 404, .. })
    }
}

/// Read-only interface to the content store.
///
/// All methods return the raw response envelope (`data` plus `meta`);
/// shape interpretation is the caller's job. Implemented by
/// [`StrapiClient`] and by in-memory fakes in tests.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// `GET {base}/api/{collection}?populate=*`
    async fn list(&self, collection: &str) -> Result<Value, UpstreamError>;

    /// `GET {base}/api/{collection}/{id}?populate=*`
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Value, UpstreamError>;

    /// `GET {base}/api/{collection}?filters[{field}][$eq]={value}&populate=*`
    async fn filter_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Value, UpstreamError>;

    /// `GET {base}/api/{collection}?pagination[pageSize]=1&pagination[withCount]=true`
    async fn count(&self, collection: &str) -> Result<Value, UpstreamError>;
}
