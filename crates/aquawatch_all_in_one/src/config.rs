use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Service name used in structured log output
    #[serde(default = "default_service_name")]
    pub service_name: String,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// JetStream stream name for telemetry messages
    #[serde(default = "default_telemetry_stream")]
    pub telemetry_stream: String,

    /// Subject pattern for the telemetry consumer filter
    #[serde(default = "default_telemetry_subject")]
    pub telemetry_subject: String,

    /// Durable consumer name
    #[serde(default = "default_telemetry_consumer_name")]
    pub telemetry_consumer_name: String,

    /// Batch size for the consumer
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // Device authentication
    /// Shared API key that every field sensor presents
    #[serde(default = "default_device_api_key")]
    pub device_api_key: String,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Connection pool size
    #[serde(default = "default_postgres_pool_size")]
    pub postgres_pool_size: usize,

    // Ledger configuration
    /// JSON-RPC endpoint of the ledger node
    #[serde(default = "default_ledger_rpc_url")]
    pub ledger_rpc_url: String,

    /// Signing key for the submitting account (0x + 64 hex characters)
    #[serde(default)]
    pub ledger_private_key: String,

    /// Deployed contract address
    #[serde(default)]
    pub ledger_contract_address: String,

    /// Chain id of the ledger network
    #[serde(default = "default_ledger_chain_id")]
    pub ledger_chain_id: u64,

    /// Gas ceiling per submission transaction
    #[serde(default = "default_ledger_gas_limit")]
    pub ledger_gas_limit: u64,

    /// Receipt poll interval in milliseconds
    #[serde(default = "default_ledger_receipt_poll_interval_ms")]
    pub ledger_receipt_poll_interval_ms: u64,

    /// How many receipt polls before giving up
    #[serde(default = "default_ledger_receipt_poll_attempts")]
    pub ledger_receipt_poll_attempts: u32,

    // Realtime hub configuration
    /// WebSocket server bind host
    #[serde(default = "default_ws_host")]
    pub ws_host: String,

    /// WebSocket server port
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,

    // Push configuration
    /// TTL header value for push deliveries, in seconds
    #[serde(default = "default_push_ttl_secs")]
    pub push_ttl_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "aquawatch-all-in-one".to_string()
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_telemetry_stream() -> String {
    "telemetry".to_string()
}

fn default_telemetry_subject() -> String {
    "telemetry.water_quality.>".to_string()
}

fn default_telemetry_consumer_name() -> String {
    "telemetry-ingest-consumer".to_string()
}

fn default_nats_batch_size() -> usize {
    30
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_device_api_key() -> String {
    "change-me-in-production".to_string()
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "aquawatch".to_string()
}

fn default_postgres_username() -> String {
    "aquawatch".to_string()
}

fn default_postgres_password() -> String {
    "aquawatch".to_string()
}

fn default_postgres_pool_size() -> usize {
    5
}

// Ledger defaults
fn default_ledger_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_ledger_chain_id() -> u64 {
    31337
}

fn default_ledger_gas_limit() -> u64 {
    300_000
}

fn default_ledger_receipt_poll_interval_ms() -> u64 {
    500
}

fn default_ledger_receipt_poll_attempts() -> u32 {
    60
}

// Realtime hub defaults
fn default_ws_host() -> String {
    "0.0.0.0".to_string()
}

fn default_ws_port() -> u16 {
    8080
}

fn default_push_ttl_secs() -> u64 {
    86_400
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("AQUAWATCH"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests mutate process environment, so they must not run concurrently
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::remove_var("AQUAWATCH_LOG_LEVEL");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.telemetry_stream, "telemetry");
        assert_eq!(config.telemetry_subject, "telemetry.water_quality.>");
        assert_eq!(config.ledger_gas_limit, 300_000);
        assert_eq!(config.ws_port, 8080);
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::set_var("AQUAWATCH_LOG_LEVEL", "debug");
        std::env::set_var("AQUAWATCH_DEVICE_API_KEY", "sensor-fleet-key");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.device_api_key, "sensor-fleet-key");

        std::env::remove_var("AQUAWATCH_LOG_LEVEL");
        std::env::remove_var("AQUAWATCH_DEVICE_API_KEY");
    }
}
