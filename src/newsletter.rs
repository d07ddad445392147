//! Newsletter subscription flow.
//!
//! Validates the request, checks that provider credentials are configured,
//! and only then calls the provider. Validation failures never reach the
//! network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Optional attribution attached to a subscription, derived from request
/// headers and query parameters. Absent fields are omitted from the
/// provider payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referring_site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
}

/// Subscription failures, each mapping to a distinct HTTP status
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("Email is required")]
    InvalidEmail,

    #[error("{reason}")]
    NotConfigured { reason: String },

    /// Provider rejected the subscription; status is passed through
    #[error("Failed to subscribe (status {status})")]
    Upstream { status: u16, details: Value },

    #[error("Failed to reach the newsletter provider: {0}")]
    Transport(String),
}

impl SubscribeError {
    /// HTTP status to surface to the caller
    pub fn status_code(&self) -> u16 {
        match self {
            SubscribeError::InvalidEmail => 400,
            SubscribeError::NotConfigured { .. } => 500,
            SubscribeError::Upstream { status, .. } => *status,
            SubscribeError::Transport(_) => 502,
        }
    }
}

/// Email subscription provider (Beehiiv in production, fakes in tests)
#[async_trait]
pub trait NewsletterProvider: Send + Sync {
    /// Subscribe an address; returns the provider's response payload
    async fn subscribe(
        &self,
        email: &str,
        attribution: &Attribution,
    ) -> Result<Value, SubscribeError>;
}

/// Subscription front door: validation, configuration check, provider call
pub struct Subscriber<P> {
    provider: Option<P>,
}

impl<P: NewsletterProvider> Subscriber<P> {
    /// `provider` is `None` when credentials are not configured; requests
    /// then fail with a configuration error rather than a silent success.
    pub fn new(provider: Option<P>) -> Self {
        Self { provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn subscribe(
        &self,
        email: &str,
        attribution: &Attribution,
    ) -> Result<Value, SubscribeError> {
        if email.trim().is_empty() {
            return Err(SubscribeError::InvalidEmail);
        }

        let provider = self.provider.as_ref().ok_or_else(|| {
            SubscribeError::NotConfigured {
                reason: "Server is not configured with Beehiiv credentials".to_string(),
            }
        })?;

        provider.subscribe(email, attribution).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribution_omits_absent_fields() {
        let attribution = Attribution {
            utm_source: Some("newsletter".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&attribution).unwrap();
        assert_eq!(value, json!({ "utm_source": "newsletter" }));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(SubscribeError::InvalidEmail.status_code(), 400);
        assert_eq!(
            SubscribeError::NotConfigured {
                reason: "x".to_string()
            }
            .status_code(),
            500
        );
        assert_eq!(
            SubscribeError::Upstream {
                status: 409,
                details: Value::Null
            }
            .status_code(),
            409
        );
        assert_eq!(SubscribeError::Transport("t".to_string()).status_code(), 502);
    }
}
