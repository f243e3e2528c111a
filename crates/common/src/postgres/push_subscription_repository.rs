use crate::domain::{DomainError, DomainResult, PushKeys, PushSubscription, PushSubscriptionRepository};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// PostgreSQL implementation of [`PushSubscriptionRepository`].
/// Subscriptions are written by the registration endpoint; the pipeline
/// only reads them.
#[derive(Clone)]
pub struct PostgresPushSubscriptionRepository {
    client: PostgresClient,
}

impl PostgresPushSubscriptionRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PushSubscriptionRepository for PostgresPushSubscriptionRepository {
    #[instrument(skip(self))]
    async fn list_subscriptions(&self) -> DomainResult<Vec<PushSubscription>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Storage)?;

        let rows = conn
            .query(
                "SELECT endpoint, p256dh, auth FROM push_subscriptions",
                &[],
            )
            .await
            .map_err(|e| DomainError::Storage(e.into()))?;

        debug!(count = rows.len(), "Fetched push subscriptions");

        Ok(rows
            .into_iter()
            .map(|row| PushSubscription {
                endpoint: row.get("endpoint"),
                keys: PushKeys {
                    p256dh: row.get("p256dh"),
                    auth: row.get("auth"),
                },
            })
            .collect())
    }
}
