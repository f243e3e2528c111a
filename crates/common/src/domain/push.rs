use crate::domain::result::DomainResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque push subscription descriptor as produced by a browser's push
/// registration. Stored by the subscription endpoint; the pipeline only
/// reads the full set and attempts delivery to each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Notification payload delivered to push endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    /// Epoch milliseconds at the time the alert fired.
    pub timestamp: i64,
}

impl NotificationPayload {
    pub fn water_quality_alert(alerts: &[String]) -> Self {
        NotificationPayload {
            title: "Water Quality Alert".to_string(),
            body: alerts.join("\n"),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PushSubscriptionRepository: Send + Sync {
    /// All registered subscriptions, in no particular order.
    async fn list_subscriptions(&self) -> DomainResult<Vec<PushSubscription>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_joins_alerts_with_newlines() {
        let alerts = vec![
            "pH out of range: 9".to_string(),
            "Salinity too high: 40".to_string(),
        ];
        let payload = NotificationPayload::water_quality_alert(&alerts);

        assert_eq!(payload.title, "Water Quality Alert");
        assert_eq!(payload.body, "pH out of range: 9\nSalinity too high: 40");
        assert!(payload.timestamp > 0);
    }
}
