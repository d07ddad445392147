//! Strapi content API client.
//!
//! Thin read-only HTTP client over the content store's REST endpoints,
//! with a short per-URL response cache standing in for the frontend's
//! "revalidate every N seconds" fetch hint.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use super::{ContentApi, UpstreamError};
use crate::config::ResolvedConfig;

/// Content API client
pub struct StrapiClient {
    /// Base URL without trailing slash
    base_url: String,
    /// How long a fetched response may be reused
    revalidate: Duration,
    /// HTTP client
    client: reqwest::Client,
    /// Per-URL response cache, expiry only
    cache: Mutex<HashMap<String, CachedResponse>>,
}

struct CachedResponse {
    fetched_at: Instant,
    body: Value,
}

impl StrapiClient {
    /// Create a client for the given base URL and revalidation window
    pub fn new(base_url: impl Into<String>, revalidate: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            revalidate,
            client: reqwest::Client::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Create from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(
            config.cms_url.clone(),
            Duration::from_secs(config.revalidate_seconds),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a collection endpoint URL with the given query pairs
    fn collection_url(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("{}/api/{}", self.base_url, path))
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Fetch a URL as JSON, honoring the revalidation cache
    async fn get_json(&self, url: Url) -> Result<Value, UpstreamError> {
        let key = url.to_string();

        if let Some(cached) = self.cached(&key) {
            tracing::debug!("Serving cached response for {}", key);
            return Ok(cached);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: key,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        self.store(key, body.clone());
        Ok(body)
    }

    fn cached(&self, key: &str) -> Option<Value> {
        let cache = self.cache.lock().expect("cache lock poisoned");
        cache
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.revalidate)
            .map(|entry| entry.body.clone())
    }

    fn store(&self, key: String, body: Value) {
        let mut cache = self.cache.lock().expect("cache lock poisoned");
        cache.insert(
            key,
            CachedResponse {
                fetched_at: Instant::now(),
                body,
            },
        );
    }
}

#[async_trait]
impl ContentApi for StrapiClient {
    async fn list(&self, collection: &str) -> Result<Value, UpstreamError> {
        let url = self.collection_url(collection, &[("populate", "*")])?;
        self.get_json(url).await
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Value, UpstreamError> {
        let url = self.collection_url(&format!("{}/{}", collection, id), &[("populate", "*")])?;
        self.get_json(url).await
    }

    async fn filter_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Value, UpstreamError> {
        let filter = format!("filters[{}][$eq]", field);
        let url = self.collection_url(collection, &[(filter.as_str(), value), ("populate", "*")])?;
        self.get_json(url).await
    }

    async fn count(&self, collection: &str) -> Result<Value, UpstreamError> {
        let url = self.collection_url(
            collection,
            &[
                ("pagination[pageSize]", "1"),
                ("pagination[withCount]", "true"),
            ],
        )?;
        self.get_json(url).await
    }
}
