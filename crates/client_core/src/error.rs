use shared::error::ProviderError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("wallet connection rejected: {0}")]
    ConnectionRejected(String),
    #[error("Invalid input value")]
    InvalidInput,
    #[error("transaction failed: {0}")]
    WriteFailed(String),
    #[error("failed to read stored value: {0}")]
    ReadFailed(String),
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wrong network: chain {0:?} is not supported")]
    WrongNetwork(Option<u64>),
    #[error("a transaction is already pending")]
    AlreadyPending,
}

impl ClientError {
    pub fn connection_rejected(err: &ProviderError) -> Self {
        Self::ConnectionRejected(err.reason().unwrap_or("request declined").to_string())
    }

    pub fn read_failed(err: impl ToString) -> Self {
        Self::ReadFailed(err.to_string())
    }
}
