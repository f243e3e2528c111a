use crate::domain::reading::SensorRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted to real-time clients over the WebSocket hub.
///
/// `sensorData` carries the full persisted record and goes out on the
/// global channel plus the sensor-scoped topic; `alert` goes out on the
/// global channel only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RealtimeEvent {
    #[serde(rename = "sensorData")]
    SensorData(SensorRecord),
    #[serde(rename = "alert")]
    Alert(AlertNotice),
}

/// Payload of an `alert` event: which sensor, which checks fired, when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNotice {
    pub sensor_id: String,
    pub alerts: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl AlertNotice {
    pub fn now(sensor_id: String, alerts: Vec<String>) -> Self {
        AlertNotice {
            sensor_id,
            alerts,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_event_serializes_with_event_tag() {
        let event = RealtimeEvent::Alert(AlertNotice::now(
            "sensor-7".to_string(),
            vec!["Turbidity too high: 5.2".to_string()],
        ));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"alert""#));
        assert!(json.contains("sensor-7"));
        assert!(json.contains("Turbidity too high: 5.2"));
    }
}
