use crate::domain::result::{DomainError, DomainResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Telemetry message as published by field sensors.
///
/// All numeric fields are optional: an absent field means "not reported",
/// never zero. Devices sometimes publish numbers as strings, so each field
/// accepts either form. Any inbound `timestamp` is deliberately ignored —
/// the server is the sole authority on record time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryMessage {
    pub api_key: String,
    pub sensor_id: String,
    #[serde(default, rename = "pH", deserialize_with = "lenient_f64")]
    pub ph: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub turbidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub salinity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub water_level: Option<f64>,
}

impl TelemetryMessage {
    pub fn from_json(payload: &[u8]) -> DomainResult<Self> {
        serde_json::from_slice(payload).map_err(|e| DomainError::MalformedMessage(e.to_string()))
    }
}

/// Accepts a JSON number or a numeric string, mapping either to `f64`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A normalized sensor reading, after authentication and parsing.
///
/// Field gaps are preserved here; the zero-filled projection exists only
/// for the ledger call ([`SensorReading::ledger_sample`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor_id: String,
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
    pub turbidity: Option<f64>,
    pub salinity: Option<f64>,
    pub water_level: Option<f64>,
}

impl SensorReading {
    /// Zero-filled projection for ledger anchoring. The ledger contract takes
    /// all five quantities, so unreported fields are submitted as zero. The
    /// stored record keeps the gaps.
    pub fn ledger_sample(&self) -> LedgerSample {
        LedgerSample {
            sensor_id: self.sensor_id.clone(),
            ph: self.ph.unwrap_or(0.0),
            temperature: self.temperature.unwrap_or(0.0),
            turbidity: self.turbidity.unwrap_or(0.0),
            salinity: self.salinity.unwrap_or(0.0),
            water_level: self.water_level.unwrap_or(0.0),
        }
    }
}

impl From<TelemetryMessage> for SensorReading {
    fn from(msg: TelemetryMessage) -> Self {
        SensorReading {
            sensor_id: msg.sensor_id,
            ph: msg.ph,
            temperature: msg.temperature,
            turbidity: msg.turbidity,
            salinity: msg.salinity,
            water_level: msg.water_level,
        }
    }
}

/// Fully-populated view of a reading destined for the ledger contract.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSample {
    pub sensor_id: String,
    pub ph: f64,
    pub temperature: f64,
    pub turbidity: f64,
    pub salinity: f64,
    pub water_level: f64,
}

/// Input for inserting a sensor record after successful anchoring.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSensorRecord {
    pub sensor_id: String,
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
    pub turbidity: Option<f64>,
    pub salinity: Option<f64>,
    pub water_level: Option<f64>,
    pub blockchain_hash: String,
}

impl NewSensorRecord {
    pub fn from_reading(reading: &SensorReading, blockchain_hash: String) -> Self {
        NewSensorRecord {
            sensor_id: reading.sensor_id.clone(),
            ph: reading.ph,
            temperature: reading.temperature,
            turbidity: reading.turbidity,
            salinity: reading.salinity,
            water_level: reading.water_level,
            blockchain_hash,
        }
    }
}

/// Persisted sensor record. Created exactly once per anchored reading and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorRecord {
    pub id: uuid::Uuid,
    pub sensor_id: String,
    #[serde(rename = "pH")]
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
    pub turbidity: Option<f64>,
    pub salinity: Option<f64>,
    pub water_level: Option<f64>,
    pub blockchain_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository trait for sensor record storage (insert-only from the
/// pipeline's perspective).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SensorRecordRepository: Send + Sync {
    /// Insert a new record, returning it with its server-assigned id and
    /// creation time.
    async fn insert_record(&self, input: NewSensorRecord) -> DomainResult<SensorRecord>;

    /// Most recent records for one sensor, newest first.
    async fn list_records(&self, sensor_id: &str, limit: i64) -> DomainResult<Vec<SensorRecord>>;
}
