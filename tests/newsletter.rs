//! Newsletter subscription flow tests
//!
//! Validation and configuration guards must run before the provider is
//! contacted; provider failures pass their status through.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use contentgw::{Attribution, NewsletterProvider, SubscribeError, Subscriber};
use serde_json::{json, Value};

/// Provider fake that records every call it receives
#[derive(Clone)]
struct RecordingProvider {
    calls: Arc<Mutex<Vec<(String, Attribution)>>>,
    /// When set, every call fails with this upstream status
    fail_with_status: Option<u16>,
}

impl RecordingProvider {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with_status: None,
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with_status: Some(status),
        }
    }

    fn calls(&self) -> Vec<(String, Attribution)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsletterProvider for RecordingProvider {
    async fn subscribe(
        &self,
        email: &str,
        attribution: &Attribution,
    ) -> Result<Value, SubscribeError> {
        self.calls
            .lock()
            .unwrap()
            .push((email.to_string(), attribution.clone()));

        match self.fail_with_status {
            Some(status) => Err(SubscribeError::Upstream {
                status,
                details: json!({ "message": "rejected" }),
            }),
            None => Ok(json!({ "data": { "id": "sub_1", "email": email } })),
        }
    }
}

#[tokio::test]
async fn test_empty_email_fails_without_contacting_the_provider() {
    let provider = RecordingProvider::new();
    let subscriber = Subscriber::new(Some(provider.clone()));

    let result = subscriber.subscribe("", &Attribution::default()).await;

    assert!(matches!(result, Err(SubscribeError::InvalidEmail)));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_whitespace_email_is_also_invalid() {
    let provider = RecordingProvider::new();
    let subscriber = Subscriber::new(Some(provider.clone()));

    let result = subscriber.subscribe("   ", &Attribution::default()).await;

    assert!(matches!(result, Err(SubscribeError::InvalidEmail)));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_missing_credentials_is_a_server_configuration_error() {
    let subscriber: Subscriber<RecordingProvider> = Subscriber::new(None);

    let result = subscriber
        .subscribe("a@example.com", &Attribution::default())
        .await;

    match result {
        Err(err @ SubscribeError::NotConfigured { .. }) => {
            assert_eq!(err.status_code(), 500);
        }
        other => panic!("expected NotConfigured, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_upstream_status_passes_through() {
    let provider = RecordingProvider::failing(429);
    let subscriber = Subscriber::new(Some(provider.clone()));

    let result = subscriber
        .subscribe("a@example.com", &Attribution::default())
        .await;

    match result {
        Err(err @ SubscribeError::Upstream { .. }) => {
            assert_eq!(err.status_code(), 429);
        }
        other => panic!("expected Upstream, got {:?}", other.map(|_| ())),
    }
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_successful_subscription_forwards_email_and_attribution() {
    let provider = RecordingProvider::new();
    let subscriber = Subscriber::new(Some(provider.clone()));

    let attribution = Attribution {
        utm_source: Some("lead_magnet".to_string()),
        referring_site: Some("https://audhd.co/guides/routines".to_string()),
        ..Default::default()
    };

    let data = subscriber
        .subscribe("a@example.com", &attribution)
        .await
        .unwrap();

    assert_eq!(data["data"]["email"], "a@example.com");

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "a@example.com");
    assert_eq!(calls[0].1, attribution);
}
