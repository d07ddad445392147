//! Beehiiv newsletter provider client.
//!
//! Creates subscriptions against the Beehiiv v2 API. Provider failures
//! carry the upstream status and body so the caller can pass them through.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::BeehiivCredentials;
use crate::newsletter::{Attribution, NewsletterProvider, SubscribeError};

/// Beehiiv API client
pub struct BeehiivClient {
    /// API key (bearer token)
    api_key: String,
    /// Publication public id (`pub_...`)
    publication_id: String,
    /// HTTP client
    client: reqwest::Client,
}

impl BeehiivClient {
    pub fn new(credentials: BeehiivCredentials) -> Self {
        Self {
            api_key: credentials.api_key,
            publication_id: credentials.publication_id,
            client: reqwest::Client::new(),
        }
    }

    /// Build the subscriptions endpoint URL
    fn api_url(&self) -> String {
        format!(
            "https://api.beehiiv.com/v2/publications/{}/subscriptions",
            self.publication_id
        )
    }

    /// Build the provider payload: email plus standing flags plus any
    /// attribution fields that are present
    fn payload(email: &str, attribution: &Attribution) -> Value {
        let mut payload = json!({
            "email": email,
            "reactivate_existing": true,
            "send_welcome_email": true,
        });

        if let (Value::Object(map), Ok(Value::Object(extra))) =
            (&mut payload, serde_json::to_value(attribution))
        {
            map.extend(extra);
        }

        payload
    }
}

#[async_trait]
impl NewsletterProvider for BeehiivClient {
    async fn subscribe(
        &self,
        email: &str,
        attribution: &Attribution,
    ) -> Result<Value, SubscribeError> {
        // A UUID here is a common misconfiguration; the API wants the
        // public id
        if !self.publication_id.starts_with("pub_") {
            return Err(SubscribeError::NotConfigured {
                reason: "BEEHIIV_PUBLICATION_ID must be the public id (format: pub_...), not a UUID"
                    .to_string(),
            });
        }

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&Self::payload(email, attribution))
            .send()
            .await
            .map_err(|e| SubscribeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let details = safe_json(response).await;
            return Err(SubscribeError::Upstream {
                status: status.as_u16(),
                details,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SubscribeError::Transport(e.to_string()))
    }
}

/// Parse the body as JSON, falling back to the raw text
async fn safe_json(response: reqwest::Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(publication_id: &str) -> BeehiivClient {
        BeehiivClient::new(BeehiivCredentials {
            api_key: "KEY".to_string(),
            publication_id: publication_id.to_string(),
        })
    }

    #[test]
    fn test_api_url() {
        assert_eq!(
            client("pub_abc123").api_url(),
            "https://api.beehiiv.com/v2/publications/pub_abc123/subscriptions"
        );
    }

    #[tokio::test]
    async fn test_non_public_id_is_rejected_before_any_request() {
        let result = client("d2f1e4aa-0000-0000-0000-000000000000")
            .subscribe("a@example.com", &Attribution::default())
            .await;

        match result {
            Err(SubscribeError::NotConfigured { reason }) => {
                assert!(reason.contains("pub_"));
            }
            other => panic!("expected NotConfigured, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_payload_merges_attribution() {
        let attribution = Attribution {
            ip_address: Some("203.0.113.9".to_string()),
            utm_campaign: Some("launch".to_string()),
            ..Default::default()
        };

        let payload = BeehiivClient::payload("a@example.com", &attribution);
        assert_eq!(payload["email"], "a@example.com");
        assert_eq!(payload["reactivate_existing"], true);
        assert_eq!(payload["send_welcome_email"], true);
        assert_eq!(payload["ip_address"], "203.0.113.9");
        assert_eq!(payload["utm_campaign"], "launch");
        assert!(payload.get("utm_source").is_none());
    }
}
