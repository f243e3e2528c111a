use async_trait::async_trait;
use common::domain::RealtimeEvent;
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Pushes pipeline events to connected real-time clients.
///
/// Broadcasting is fire-and-forget: a slow or disconnected client never
/// fails the caller.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BroadcastHub: Send + Sync {
    /// Deliver an event to every connected client.
    async fn broadcast_all(&self, event: &RealtimeEvent);

    /// Deliver an event to clients subscribed to the given sensor topic.
    async fn broadcast_topic(&self, topic: &str, event: &RealtimeEvent);
}

struct ClientHandle {
    tx: mpsc::UnboundedSender<RealtimeEvent>,
    topics: HashSet<String>,
}

/// Connection registry keyed by connection id. Each client owns an
/// unbounded channel drained by its socket task; topic membership is a
/// plain set per client.
#[derive(Default)]
pub struct SensorHub {
    clients: RwLock<HashMap<Uuid, ClientHandle>>,
}

impl SensorHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection, returning its id and the event stream
    /// the socket task should drain.
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<RealtimeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client_id = Uuid::new_v4();

        let mut clients = self.clients.write().await;
        clients.insert(
            client_id,
            ClientHandle {
                tx,
                topics: HashSet::new(),
            },
        );
        info!(client_id = %client_id, connected = clients.len(), "Client registered");

        (client_id, rx)
    }

    pub async fn unregister(&self, client_id: Uuid) {
        let mut clients = self.clients.write().await;
        clients.remove(&client_id);
        info!(client_id = %client_id, connected = clients.len(), "Client unregistered");
    }

    pub async fn subscribe(&self, client_id: Uuid, topic: &str) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get_mut(&client_id) {
            client.topics.insert(topic.to_string());
            debug!(client_id = %client_id, topic, "Client joined topic");
        }
    }

    pub async fn unsubscribe(&self, client_id: Uuid, topic: &str) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get_mut(&client_id) {
            client.topics.remove(topic);
            debug!(client_id = %client_id, topic, "Client left topic");
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[async_trait]
impl BroadcastHub for SensorHub {
    async fn broadcast_all(&self, event: &RealtimeEvent) {
        let clients = self.clients.read().await;
        for client in clients.values() {
            // A closed channel means the socket task is already tearing
            // down; unregister will clean it up.
            let _ = client.tx.send(event.clone());
        }
    }

    async fn broadcast_topic(&self, topic: &str, event: &RealtimeEvent) {
        let clients = self.clients.read().await;
        for client in clients.values() {
            if client.topics.contains(topic) {
                let _ = client.tx.send(event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::AlertNotice;

    fn alert_event(sensor_id: &str) -> RealtimeEvent {
        RealtimeEvent::Alert(AlertNotice::now(
            sensor_id.to_string(),
            vec!["pH out of range: 9".to_string()],
        ))
    }

    #[tokio::test]
    async fn broadcast_all_reaches_every_client() {
        let hub = SensorHub::new();
        let (_id_a, mut rx_a) = hub.register().await;
        let (_id_b, mut rx_b) = hub.register().await;

        hub.broadcast_all(&alert_event("sensor-1")).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_topic_only_reaches_members() {
        let hub = SensorHub::new();
        let (id_a, mut rx_a) = hub.register().await;
        let (_id_b, mut rx_b) = hub.register().await;

        hub.subscribe(id_a, "sensor-1").await;
        hub.broadcast_topic("sensor-1", &alert_event("sensor-1")).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_topic_delivery() {
        let hub = SensorHub::new();
        let (id, mut rx) = hub.register().await;

        hub.subscribe(id, "sensor-1").await;
        hub.unsubscribe(id, "sensor-1").await;
        hub.broadcast_topic("sensor-1", &alert_event("sensor-1")).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_removes_the_client() {
        let hub = SensorHub::new();
        let (id, _rx) = hub.register().await;
        assert_eq!(hub.client_count().await, 1);

        hub.unregister(id).await;
        assert_eq!(hub.client_count().await, 0);
    }

    #[tokio::test]
    async fn broadcast_to_closed_channel_does_not_panic() {
        let hub = SensorHub::new();
        let (_id, rx) = hub.register().await;
        drop(rx);

        hub.broadcast_all(&alert_event("sensor-1")).await;
    }
}
