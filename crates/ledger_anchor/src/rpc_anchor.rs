use crate::anchor::{LedgerAnchor, LedgerConfig};
use crate::scale::{scale_sample, unscale_reading, LedgerReading};
use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, LedgerSample};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const SUBMIT_METHOD: &str = "waterquality_submitReading";
const RECEIPT_METHOD: &str = "waterquality_getTransactionReceipt";
const READINGS_METHOD: &str = "waterquality_getReadings";

/// Ledger anchoring adapter speaking JSON-RPC to the contract gateway of
/// the ledger node. The gateway signs each transaction with the private
/// key carried in the submission params, so the key is validated at
/// construction and forwarded on every submit.
///
/// Submissions for the same sensor are serialized through a per-sensor
/// async gate: two concurrent messages for one sensor would otherwise race
/// on transaction ordering at the node. Different sensors still submit
/// concurrently.
pub struct RpcLedgerAnchor {
    http: reqwest::Client,
    config: LedgerConfig,
    request_id: AtomicU64,
    submission_gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitParams<'a> {
    contract: &'a str,
    chain_id: u64,
    gas_limit: u64,
    private_key: &'a str,
    sensor_id: &'a str,
    #[serde(rename = "pH")]
    ph: u64,
    temperature: u64,
    turbidity: u64,
    salinity: u64,
    water_level: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResult {
    tx_hash: String,
}

#[derive(Deserialize)]
struct Receipt {
    /// 1 for success, 0 for a reverted transaction.
    status: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReading {
    sensor_id: String,
    #[serde(rename = "pH")]
    ph: u64,
    temperature: u64,
    turbidity: u64,
    salinity: u64,
    water_level: u64,
    timestamp: i64,
}

impl RpcLedgerAnchor {
    /// Construction fails if credentials are missing or malformed; a bad
    /// key must never make it as far as the first submission.
    pub fn new(config: LedgerConfig) -> DomainResult<Self> {
        config.validate()?;

        info!(
            rpc_url = %config.rpc_url,
            contract = %config.contract_address,
            chain_id = config.chain_id,
            "Ledger anchoring adapter initialized"
        );

        Ok(Self {
            http: reqwest::Client::new(),
            config,
            request_id: AtomicU64::new(1),
            submission_gates: Mutex::new(HashMap::new()),
        })
    }

    async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> DomainResult<Option<T>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response: RpcResponse<T> = self
            .http
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Anchoring(format!("RPC request failed: {e}")))?
            .json()
            .await
            .map_err(|e| DomainError::Anchoring(format!("invalid RPC response: {e}")))?;

        if let Some(err) = response.error {
            return Err(DomainError::Anchoring(format!(
                "RPC error {}: {}",
                err.code, err.message
            )));
        }

        Ok(response.result)
    }

    async fn sensor_gate(&self, sensor_id: &str) -> Arc<Mutex<()>> {
        let mut gates = self.submission_gates.lock().await;
        // A gate only the map still holds has no submission in flight;
        // drop those so the map does not grow with every sensor ever seen.
        gates.retain(|_, gate| Arc::strong_count(gate) > 1);
        gates
            .entry(sensor_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Poll for the receipt until the transaction confirms or the attempt
    /// budget runs out. A `null` receipt means still pending.
    async fn wait_for_receipt(&self, tx_hash: &str) -> DomainResult<()> {
        for attempt in 0..self.config.receipt_poll_attempts {
            if let Some(receipt) = self.call::<_, Receipt>(RECEIPT_METHOD, (tx_hash,)).await? {
                if receipt.status != 1 {
                    return Err(DomainError::Anchoring(format!(
                        "transaction {tx_hash} reverted with status {}",
                        receipt.status
                    )));
                }
                debug!(tx_hash = %tx_hash, attempt, "Transaction confirmed");
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(self.config.receipt_poll_interval_ms)).await;
        }

        Err(DomainError::Anchoring(format!(
            "transaction {tx_hash} not confirmed after {} polls",
            self.config.receipt_poll_attempts
        )))
    }
}

#[async_trait]
impl LedgerAnchor for RpcLedgerAnchor {
    #[instrument(skip(self, sample), fields(sensor_id = %sample.sensor_id))]
    async fn submit_reading(&self, sample: &LedgerSample) -> DomainResult<String> {
        let scaled = scale_sample(sample)?;

        let gate = self.sensor_gate(&sample.sensor_id).await;
        let _serialized = gate.lock().await;
        info!(
            sensor_id = %scaled.sensor_id,
            ph = scaled.ph,
            temperature = scaled.temperature,
            turbidity = scaled.turbidity,
            salinity = scaled.salinity,
            water_level = scaled.water_level,
            "Submitting reading to ledger"
        );

        let params = SubmitParams {
            contract: &self.config.contract_address,
            chain_id: self.config.chain_id,
            gas_limit: self.config.gas_limit,
            private_key: &self.config.private_key,
            sensor_id: &scaled.sensor_id,
            ph: scaled.ph,
            temperature: scaled.temperature,
            turbidity: scaled.turbidity,
            salinity: scaled.salinity,
            water_level: scaled.water_level,
        };

        let submitted: SubmitResult = self
            .call(SUBMIT_METHOD, (params,))
            .await?
            .ok_or_else(|| DomainError::Anchoring("submission returned no result".to_string()))?;

        self.wait_for_receipt(&submitted.tx_hash).await?;

        info!(tx_hash = %submitted.tx_hash, "Reading anchored to ledger");
        Ok(submitted.tx_hash)
    }

    #[instrument(skip(self))]
    async fn fetch_readings(&self) -> DomainResult<Vec<LedgerReading>> {
        let raw: Vec<RawReading> = self
            .call(READINGS_METHOD, Vec::<String>::new())
            .await?
            .unwrap_or_default();

        if raw.is_empty() {
            warn!("Ledger returned no historical readings");
        }

        Ok(raw
            .into_iter()
            .map(|r| {
                unscale_reading(
                    r.sensor_id,
                    r.ph,
                    r.temperature,
                    r.turbidity,
                    r.salinity,
                    r.water_level,
                    r.timestamp,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LedgerConfig {
        LedgerConfig {
            rpc_url: "http://localhost:8545".to_string(),
            private_key: format!("0x{}", "cd".repeat(32)),
            contract_address: "0x2222222222222222222222222222222222222222".to_string(),
            chain_id: 31337,
            gas_limit: 300_000,
            receipt_poll_interval_ms: 10,
            receipt_poll_attempts: 3,
        }
    }

    #[test]
    fn construction_validates_credentials() {
        assert!(RpcLedgerAnchor::new(config()).is_ok());

        let mut bad = config();
        bad.private_key = "not-a-key".to_string();
        assert!(matches!(
            RpcLedgerAnchor::new(bad),
            Err(DomainError::InvalidLedgerCredentials(_))
        ));
    }

    #[tokio::test]
    async fn sensor_gate_is_shared_per_sensor() {
        let anchor = RpcLedgerAnchor::new(config()).unwrap();

        let first = anchor.sensor_gate("sensor-1").await;
        let again = anchor.sensor_gate("sensor-1").await;
        let other = anchor.sensor_gate("sensor-2").await;

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn released_sensor_gates_are_evicted() {
        let anchor = RpcLedgerAnchor::new(config()).unwrap();

        let idle = anchor.sensor_gate("sensor-1").await;
        drop(idle);
        let held = anchor.sensor_gate("sensor-2").await;
        let _third = anchor.sensor_gate("sensor-3").await;

        let gates = anchor.submission_gates.lock().await;
        assert!(!gates.contains_key("sensor-1"));
        assert!(gates.contains_key("sensor-2"));
        assert!(gates.contains_key("sensor-3"));
        drop(gates);
        drop(held);
    }

    #[tokio::test]
    async fn negative_reading_fails_before_submission() {
        let anchor = RpcLedgerAnchor::new(config()).unwrap();
        let sample = LedgerSample {
            sensor_id: "sensor-1".to_string(),
            ph: 7.0,
            temperature: -2.0,
            turbidity: 3.0,
            salinity: 0.5,
            water_level: 1.0,
        };

        // Fails on scaling, before any gate or RPC traffic.
        let result = anchor.submit_reading(&sample).await;
        assert!(matches!(result, Err(DomainError::Anchoring(_))));
        assert!(anchor.submission_gates.lock().await.is_empty());
    }

    #[test]
    fn submit_params_carry_contract_and_signing_fields() {
        let key = format!("0x{}", "cd".repeat(32));
        let params = SubmitParams {
            contract: "0x2222222222222222222222222222222222222222",
            chain_id: 31337,
            gas_limit: 300_000,
            private_key: &key,
            sensor_id: "sensor-1",
            ph: 72,
            temperature: 255,
            turbidity: 3456,
            salinity: 5,
            water_level: 18,
        };

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["pH"], 72);
        assert_eq!(json["gasLimit"], 300_000);
        assert_eq!(json["chainId"], 31337);
        assert_eq!(json["privateKey"], key.as_str());
        assert_eq!(json["waterLevel"], 18);
    }
}
