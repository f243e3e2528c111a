use crate::domain::{DomainError, DomainResult, Threshold, ThresholdRepository};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// PostgreSQL implementation of [`ThresholdRepository`]. The `thresholds`
/// table carries a unique index on `sensor_id`, so the lookup returns at
/// most one row.
#[derive(Clone)]
pub struct PostgresThresholdRepository {
    client: PostgresClient,
}

impl PostgresThresholdRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ThresholdRepository for PostgresThresholdRepository {
    #[instrument(skip(self))]
    async fn get_threshold(&self, sensor_id: &str) -> DomainResult<Option<Threshold>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Storage)?;

        debug!(sensor_id = %sensor_id, "Fetching threshold configuration");

        let row = conn
            .query_opt(
                "SELECT sensor_id, ph_min, ph_max, temp_min, temp_max,
                        turbidity_max, salinity_max, water_level_min,
                        created_at, updated_at
                 FROM thresholds
                 WHERE sensor_id = $1",
                &[&sensor_id],
            )
            .await
            .map_err(|e| DomainError::Storage(e.into()))?;

        Ok(row.map(|row| Threshold {
            sensor_id: row.get("sensor_id"),
            ph_min: row.get("ph_min"),
            ph_max: row.get("ph_max"),
            temp_min: row.get("temp_min"),
            temp_max: row.get("temp_max"),
            turbidity_max: row.get("turbidity_max"),
            salinity_max: row.get("salinity_max"),
            water_level_min: row.get("water_level_min"),
            created_at: Some(row.get("created_at")),
            updated_at: Some(row.get("updated_at")),
        }))
    }
}
