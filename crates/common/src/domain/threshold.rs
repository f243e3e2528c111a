use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator-configured acceptable ranges for one sensor. At most one
/// threshold document exists per sensor id; the management API upserts on
/// that key. The pipeline only ever reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    pub sensor_id: String,
    #[serde(rename = "pHMin")]
    pub ph_min: f64,
    #[serde(rename = "pHMax")]
    pub ph_max: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub turbidity_max: f64,
    pub salinity_max: f64,
    pub water_level_min: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read-only threshold lookup. Absence is a valid state, not an error;
/// genuine storage failures surface as `DomainError::Storage`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThresholdRepository: Send + Sync {
    async fn get_threshold(&self, sensor_id: &str) -> DomainResult<Option<Threshold>>;
}
