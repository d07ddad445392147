//! HTTP service exposing the gateway.
//!
//! Routes:
//! - `POST /api/subscribe` — newsletter signup, provider status passed through
//! - `GET /api/resolve/:identifier` — probe the configured collections
//! - `GET /api/env-check` — which config values are present (no secrets)
//! - `GET /healthz` — liveness
//!
//! Cross-origin requests are allowed from the local-dev defaults plus the
//! configured extra origins.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::adapters::{BeehiivClient, StrapiClient};
use crate::config::{self, ResolvedConfig};
use crate::newsletter::{Attribution, SubscribeError, Subscriber};
use crate::resolve::Prober;

/// Shared per-process state
pub struct AppState {
    pub prober: Prober<StrapiClient>,
    pub subscriber: Subscriber<BeehiivClient>,
    pub config: &'static ResolvedConfig,
}

/// Build the application router from resolved configuration
pub fn app(config: &'static ResolvedConfig) -> Router {
    let client = StrapiClient::from_config(config);
    let prober = Prober::new(client, config.slug_fields.clone());
    let provider = config.beehiiv.clone().map(BeehiivClient::new);
    let subscriber = Subscriber::new(provider);

    router(Arc::new(AppState {
        prober,
        subscriber,
        config,
    }))
}

/// Assemble routes and the CORS layer around the given state
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/env-check", get(env_check))
        .route("/api/resolve/:identifier", get(resolve_record))
        .route("/api/subscribe", post(subscribe))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(address: &str) -> Result<()> {
    let config = config::config()?;
    let app = app(config);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// CORS layer: local-dev defaults plus configured extras
fn cors_layer(config: &ResolvedConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Report which configuration values are present, booleans only for
/// anything secret
async fn env_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cfg = state.config;
    Json(json!({
        "cms": {
            "url": cfg.cms_url,
            "collections": cfg.collections,
            "list_collections": cfg.list_collections,
        },
        "newsletter": {
            "credentials_present": state.subscriber.is_configured(),
        },
        "config_file": cfg.config_file.as_ref().map(|p| p.display().to_string()),
    }))
}

async fn resolve_record(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> Response {
    match state
        .prober
        .find_record(&identifier, &state.config.collections)
        .await
    {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Record not found" })),
        )
            .into_response(),
    }
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Response {
    // Email must be a non-empty string; anything else is a validation
    // failure, not a deserialization error
    let email = body
        .as_ref()
        .and_then(|Json(body)| body.get("email"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let attribution = attribution_from(&headers, &params);

    match state.subscriber.subscribe(&email, &attribution).await {
        Ok(data) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": data })),
        )
            .into_response(),
        Err(err) => subscribe_error_response(err),
    }
}

/// Derive attribution fields from proxy headers and UTM query parameters
fn attribution_from(headers: &HeaderMap, params: &HashMap<String, String>) -> Attribution {
    let first_forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());

    Attribution {
        ip_address: first_forwarded.or_else(|| header_str(headers, "x-real-ip")),
        user_agent: header_str(headers, "user-agent"),
        referring_site: header_str(headers, "referer").or_else(|| header_str(headers, "referrer")),
        utm_source: params.get("utm_source").cloned(),
        utm_medium: params.get("utm_medium").cloned(),
        utm_campaign: params.get("utm_campaign").cloned(),
        utm_term: params.get("utm_term").cloned(),
        utm_content: params.get("utm_content").cloned(),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn subscribe_error_response(err: SubscribeError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = match &err {
        SubscribeError::Upstream { details, .. } => {
            json!({ "error": "Failed to subscribe", "details": details })
        }
        other => json!({ "error": other.to_string() }),
    };

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribution_from_headers_and_params() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert("user-agent", "test-agent".parse().unwrap());
        headers.insert("referer", "https://audhd.co/guides".parse().unwrap());

        let mut params = HashMap::new();
        params.insert("utm_source".to_string(), "newsletter".to_string());

        let attribution = attribution_from(&headers, &params);
        assert_eq!(attribution.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(attribution.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(
            attribution.referring_site.as_deref(),
            Some("https://audhd.co/guides")
        );
        assert_eq!(attribution.utm_source.as_deref(), Some("newsletter"));
        assert!(attribution.utm_medium.is_none());
    }

    #[test]
    fn test_attribution_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.7".parse().unwrap());

        let attribution = attribution_from(&headers, &HashMap::new());
        assert_eq!(attribution.ip_address.as_deref(), Some("198.51.100.7"));
    }

    #[test]
    fn test_error_responses_use_taxonomy_statuses() {
        let response = subscribe_error_response(SubscribeError::InvalidEmail);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = subscribe_error_response(SubscribeError::Upstream {
            status: 409,
            details: Value::Null,
        });
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
