use async_trait::async_trait;
use common::domain::{
    DomainResult, NotificationPayload, PushSubscription, PushSubscriptionRepository,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Per-endpoint outcome of one fan-out run.
///
/// Failed endpoints are reported for offline cleanup; this component never
/// retries and never prunes.
#[derive(Debug, Default, PartialEq)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    pub failed: Vec<FailedDelivery>,
}

#[derive(Debug, PartialEq)]
pub struct FailedDelivery {
    pub endpoint: String,
    pub reason: String,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Sends one serialized notification to one subscription endpoint.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, payload: &str) -> DomainResult<()>;
}

/// Delivers an alert notification to every registered push subscription.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify_all(&self, payload: &NotificationPayload) -> DomainResult<DeliveryReport>;
}

/// Fan-out over the stored subscription set. Every endpoint is attempted
/// independently; an expired or rejecting endpoint never blocks the rest.
pub struct PushFanout {
    subscriptions: Arc<dyn PushSubscriptionRepository>,
    sender: Arc<dyn PushSender>,
}

impl PushFanout {
    pub fn new(
        subscriptions: Arc<dyn PushSubscriptionRepository>,
        sender: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            subscriptions,
            sender,
        }
    }
}

#[async_trait]
impl AlertNotifier for PushFanout {
    #[instrument(skip(self, payload), fields(title = %payload.title))]
    async fn notify_all(&self, payload: &NotificationPayload) -> DomainResult<DeliveryReport> {
        let subscriptions = self.subscriptions.list_subscriptions().await?;
        let body = serde_json::to_string(payload)
            .map_err(|e| common::domain::DomainError::MalformedMessage(e.to_string()))?;

        let mut report = DeliveryReport::default();
        for subscription in &subscriptions {
            info!(endpoint = %subscription.endpoint, "Attempting push delivery");
            match self.sender.send(subscription, &body).await {
                Ok(()) => {
                    report.delivered.push(subscription.endpoint.clone());
                }
                Err(e) => {
                    error!(endpoint = %subscription.endpoint, error = %e, "Push delivery failed");
                    report.failed.push(FailedDelivery {
                        endpoint: subscription.endpoint.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            attempted = report.attempted(),
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Push fan-out complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{DomainError, MockPushSubscriptionRepository, PushKeys};

    fn subscription(endpoint: &str) -> PushSubscription {
        PushSubscription {
            endpoint: endpoint.to_string(),
            keys: PushKeys {
                p256dh: "p256dh-key".to_string(),
                auth: "auth-secret".to_string(),
            },
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload::water_quality_alert(&["pH out of range: 9".to_string()])
    }

    #[tokio::test]
    async fn delivers_to_every_subscription() {
        let mut repo = MockPushSubscriptionRepository::new();
        repo.expect_list_subscriptions().times(1).return_once(|| {
            Ok(vec![subscription("https://push.example/a"), subscription("https://push.example/b")])
        });

        let mut sender = MockPushSender::new();
        sender.expect_send().times(2).returning(|_, _| Ok(()));

        let fanout = PushFanout::new(Arc::new(repo), Arc::new(sender));
        let report = fanout.notify_all(&payload()).await.unwrap();

        assert_eq!(report.delivered.len(), 2);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn one_failing_endpoint_does_not_block_the_rest() {
        let mut repo = MockPushSubscriptionRepository::new();
        repo.expect_list_subscriptions().times(1).return_once(|| {
            Ok(vec![
                subscription("https://push.example/a"),
                subscription("https://push.example/expired"),
                subscription("https://push.example/c"),
            ])
        });

        let mut sender = MockPushSender::new();
        sender.expect_send().times(3).returning(|sub, _| {
            if sub.endpoint.ends_with("expired") {
                Err(DomainError::Delivery {
                    endpoint: sub.endpoint.clone(),
                    reason: "410 Gone".to_string(),
                })
            } else {
                Ok(())
            }
        });

        let fanout = PushFanout::new(Arc::new(repo), Arc::new(sender));
        let report = fanout.notify_all(&payload()).await.unwrap();

        assert_eq!(report.delivered.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].endpoint, "https://push.example/expired");
    }

    #[tokio::test]
    async fn subscription_fetch_failure_propagates() {
        let mut repo = MockPushSubscriptionRepository::new();
        repo.expect_list_subscriptions()
            .times(1)
            .return_once(|| Err(DomainError::Storage(anyhow::anyhow!("db down"))));

        let sender = MockPushSender::new();
        let fanout = PushFanout::new(Arc::new(repo), Arc::new(sender));

        assert!(fanout.notify_all(&payload()).await.is_err());
    }

    #[tokio::test]
    async fn empty_subscription_set_is_a_no_op() {
        let mut repo = MockPushSubscriptionRepository::new();
        repo.expect_list_subscriptions()
            .times(1)
            .return_once(|| Ok(vec![]));

        let sender = MockPushSender::new();
        let fanout = PushFanout::new(Arc::new(repo), Arc::new(sender));
        let report = fanout.notify_all(&payload()).await.unwrap();

        assert_eq!(report.attempted(), 0);
    }
}
