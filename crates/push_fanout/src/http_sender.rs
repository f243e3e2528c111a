use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, PushSubscription};
use std::time::Duration;

use crate::fanout::PushSender;

const DEFAULT_TTL_SECONDS: u64 = 86_400;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Push delivery over HTTP to the subscription's push service endpoint.
///
/// The serialized notification is posted as the request body with the
/// subscription's encryption keys carried in headers. A non-2xx response
/// is a delivery failure for that endpoint only.
pub struct HttpPushSender {
    http: reqwest::Client,
    ttl_seconds: u64,
}

impl HttpPushSender {
    pub fn new(ttl_seconds: Option<u64>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            ttl_seconds: ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS),
        }
    }
}

impl Default for HttpPushSender {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, subscription: &PushSubscription, payload: &str) -> DomainResult<()> {
        let response = self
            .http
            .post(&subscription.endpoint)
            .header("TTL", self.ttl_seconds)
            .header("Content-Type", "application/json")
            .header("X-Push-P256dh", &subscription.keys.p256dh)
            .header("X-Push-Auth", &subscription.keys.auth)
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| DomainError::Delivery {
                endpoint: subscription.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Delivery {
                endpoint: subscription.endpoint.clone(),
                reason: format!("push service responded with {status}"),
            });
        }

        Ok(())
    }
}
