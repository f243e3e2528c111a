use crate::domain::{DomainError, DomainResult, NewSensorRecord, SensorRecord, SensorRecordRepository};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of [`SensorRecordRepository`].
///
/// Records are insert-only; `updated_at` equals `created_at` and is carried
/// only so the row shape matches the rest of the schema.
#[derive(Clone)]
pub struct PostgresSensorRecordRepository {
    client: PostgresClient,
}

impl PostgresSensorRecordRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

fn record_from_row(row: &Row) -> SensorRecord {
    SensorRecord {
        id: row.get("id"),
        sensor_id: row.get("sensor_id"),
        ph: row.get("ph"),
        temperature: row.get("temperature"),
        turbidity: row.get("turbidity"),
        salinity: row.get("salinity"),
        water_level: row.get("water_level"),
        blockchain_hash: row.get("blockchain_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl SensorRecordRepository for PostgresSensorRecordRepository {
    #[instrument(skip(self), fields(sensor_id = %input.sensor_id))]
    async fn insert_record(&self, input: NewSensorRecord) -> DomainResult<SensorRecord> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Storage)?;

        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO sensor_records
                 (id, sensor_id, ph, temperature, turbidity, salinity, water_level,
                  blockchain_hash, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            &[
                &id,
                &input.sensor_id,
                &input.ph,
                &input.temperature,
                &input.turbidity,
                &input.salinity,
                &input.water_level,
                &input.blockchain_hash,
                &now,
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::Storage(e.into()))?;

        debug!(sensor_id = %input.sensor_id, record_id = %id, "Sensor record stored");

        Ok(SensorRecord {
            id,
            sensor_id: input.sensor_id,
            ph: input.ph,
            temperature: input.temperature,
            turbidity: input.turbidity,
            salinity: input.salinity,
            water_level: input.water_level,
            blockchain_hash: input.blockchain_hash,
            created_at: now,
            updated_at: now,
        })
    }

    #[instrument(skip(self))]
    async fn list_records(&self, sensor_id: &str, limit: i64) -> DomainResult<Vec<SensorRecord>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Storage)?;

        let rows = conn
            .query(
                "SELECT id, sensor_id, ph, temperature, turbidity, salinity, water_level,
                        blockchain_hash, created_at, updated_at
                 FROM sensor_records
                 WHERE sensor_id = $1
                 ORDER BY created_at DESC
                 LIMIT $2",
                &[&sensor_id, &limit],
            )
            .await
            .map_err(|e| DomainError::Storage(e.into()))?;

        Ok(rows.iter().map(record_from_row).collect())
    }
}
