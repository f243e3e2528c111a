use crate::scale::LedgerReading;
use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, LedgerSample};

/// Anchors sensor readings to the immutable ledger.
///
/// `submit_reading` is state-changing: it submits a transaction carrying
/// the fixed-point reading and waits for confirmation. A submission error
/// or a non-success receipt both fail the call; callers treat any failure
/// as a hard gate for the rest of their pipeline.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LedgerAnchor: Send + Sync {
    /// Submit one reading, returning the confirmed transaction hash.
    async fn submit_reading(&self, sample: &LedgerSample) -> DomainResult<String>;

    /// All historical readings stored by the contract, unscaled back to
    /// floating point.
    async fn fetch_readings(&self) -> DomainResult<Vec<LedgerReading>>;
}

/// Connection credentials for the ledger node.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    /// Signing key for the submitting account: `0x` followed by 64 hex
    /// characters.
    pub private_key: String,
    pub contract_address: String,
    pub chain_id: u64,
    /// Gas ceiling per submission transaction.
    pub gas_limit: u64,
    /// How often to poll for the transaction receipt, in milliseconds.
    pub receipt_poll_interval_ms: u64,
    /// How many polls before giving up on confirmation.
    pub receipt_poll_attempts: u32,
}

impl LedgerConfig {
    /// Reject missing or malformed credentials up front, before any
    /// message processing starts.
    pub fn validate(&self) -> DomainResult<()> {
        if self.rpc_url.is_empty() {
            return Err(DomainError::InvalidLedgerCredentials(
                "RPC URL is required".to_string(),
            ));
        }
        if self.contract_address.is_empty() {
            return Err(DomainError::InvalidLedgerCredentials(
                "contract address is required".to_string(),
            ));
        }
        if self.private_key.is_empty() {
            return Err(DomainError::InvalidLedgerCredentials(
                "private key is required".to_string(),
            ));
        }
        let hex_part = self
            .private_key
            .strip_prefix("0x")
            .ok_or_else(|| DomainError::InvalidLedgerCredentials(
                "private key must start with 0x".to_string(),
            ))?;
        if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidLedgerCredentials(
                "private key must be 64 hex characters after the 0x prefix".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> LedgerConfig {
        LedgerConfig {
            rpc_url: "http://localhost:8545".to_string(),
            private_key: format!("0x{}", "ab".repeat(32)),
            contract_address: "0x1111111111111111111111111111111111111111".to_string(),
            chain_id: 31337,
            gas_limit: 300_000,
            receipt_poll_interval_ms: 500,
            receipt_poll_attempts: 60,
        }
    }

    #[test]
    fn accepts_valid_credentials() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_missing_rpc_url() {
        let mut config = valid_config();
        config.rpc_url = String::new();
        assert!(matches!(
            config.validate(),
            Err(DomainError::InvalidLedgerCredentials(_))
        ));
    }

    #[test]
    fn rejects_missing_contract_address() {
        let mut config = valid_config();
        config.contract_address = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_key_without_prefix() {
        let mut config = valid_config();
        config.private_key = "ab".repeat(33);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_key_of_wrong_length() {
        let mut config = valid_config();
        config.private_key = "0xabcd".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_hex_key() {
        let mut config = valid_config();
        config.private_key = format!("0x{}", "zz".repeat(32));
        assert!(config.validate().is_err());
    }
}
