use crate::domain::evaluate_thresholds;
use common::domain::{
    AlertNotice, DomainError, DomainResult, NewSensorRecord, NotificationPayload, RealtimeEvent,
    SensorReading, SensorRecordRepository, TelemetryMessage, ThresholdRepository,
};
use ledger_anchor::LedgerAnchor;
use push_fanout::AlertNotifier;
use realtime_hub::BroadcastHub;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Domain service that carries one telemetry message through the whole
/// pipeline.
///
/// Flow:
/// 1. Parse the JSON payload into a telemetry message
/// 2. Authenticate the shared device API key
/// 3. Anchor the reading to the ledger (hard gate)
/// 4. Evaluate configured thresholds and fan out any alerts
/// 5. Persist the record with its transaction hash (hard gate)
/// 6. Broadcast the persisted record to real-time clients
///
/// Alert fan-out failures are logged and swallowed: a dead push endpoint
/// must never cost us the record. Everything before persistence that
/// fails aborts the message entirely.
pub struct TelemetryIngestService {
    device_api_key: String,
    ledger: Arc<dyn LedgerAnchor>,
    thresholds: Arc<dyn ThresholdRepository>,
    records: Arc<dyn SensorRecordRepository>,
    hub: Arc<dyn BroadcastHub>,
    notifier: Arc<dyn AlertNotifier>,
}

impl TelemetryIngestService {
    pub fn new(
        device_api_key: String,
        ledger: Arc<dyn LedgerAnchor>,
        thresholds: Arc<dyn ThresholdRepository>,
        records: Arc<dyn SensorRecordRepository>,
        hub: Arc<dyn BroadcastHub>,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            device_api_key,
            ledger,
            thresholds,
            records,
            hub,
            notifier,
        }
    }

    #[instrument(skip(self, payload), fields(payload_size = payload.len()))]
    pub async fn process_message(&self, payload: &[u8]) -> DomainResult<()> {
        let message = TelemetryMessage::from_json(payload)?;

        if message.api_key != self.device_api_key {
            warn!(sensor_id = %message.sensor_id, "rejecting message with invalid API key");
            return Err(DomainError::AuthenticationRejected);
        }

        let reading: SensorReading = message.into();
        debug!(sensor_id = %reading.sensor_id, "processing authenticated reading");

        let tx_hash = self.ledger.submit_reading(&reading.ledger_sample()).await?;

        self.check_thresholds(&reading).await?;

        let record = self
            .records
            .insert_record(NewSensorRecord::from_reading(&reading, tx_hash))
            .await?;

        // Global feed plus the sensor-scoped room, matching what dashboard
        // clients subscribe to.
        let event = RealtimeEvent::SensorData(record);
        self.hub.broadcast_all(&event).await;
        self.hub.broadcast_topic(&reading.sensor_id, &event).await;

        info!(sensor_id = %reading.sensor_id, "reading processed and broadcast");
        Ok(())
    }

    /// Evaluate thresholds and fan alerts out to both channels. A missing
    /// threshold document means no checks are configured for this sensor.
    async fn check_thresholds(&self, reading: &SensorReading) -> DomainResult<()> {
        let Some(threshold) = self.thresholds.get_threshold(&reading.sensor_id).await? else {
            debug!(sensor_id = %reading.sensor_id, "no thresholds configured, skipping checks");
            return Ok(());
        };

        let alerts = evaluate_thresholds(reading, &threshold);
        if alerts.is_empty() {
            return Ok(());
        }

        warn!(
            sensor_id = %reading.sensor_id,
            alert_count = alerts.len(),
            "threshold violations detected"
        );

        self.hub
            .broadcast_all(&RealtimeEvent::Alert(AlertNotice::now(
                reading.sensor_id.clone(),
                alerts.clone(),
            )))
            .await;

        // Push delivery problems are isolated here: the record still gets
        // persisted and broadcast.
        let payload = NotificationPayload::water_quality_alert(&alerts);
        match self.notifier.notify_all(&payload).await {
            Ok(report) if !report.failed.is_empty() => {
                warn!(
                    delivered = report.delivered.len(),
                    failed = report.failed.len(),
                    "some push deliveries failed"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "push fan-out failed, continuing pipeline");
            }
        }

        Ok(())
    }
}
