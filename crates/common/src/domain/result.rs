use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid device API key")]
    AuthenticationRejected,

    #[error("malformed telemetry payload: {0}")]
    MalformedMessage(String),

    #[error("ledger anchoring failed: {0}")]
    Anchoring(String),

    #[error("invalid ledger credentials: {0}")]
    InvalidLedgerCredentials(String),

    #[error("push delivery failed for {endpoint}: {reason}")]
    Delivery { endpoint: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
