use serde::{Deserialize, Serialize};
use thiserror::Error;

/// EIP-1193 / JSON-RPC error codes the client reacts to.
pub mod codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL: i64 = -32603;
}

/// Error object as it appears inside a JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, message)
    }

    pub fn user_rejected() -> Self {
        Self::new(codes::USER_REJECTED, "User rejected the request.")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == codes::USER_REJECTED
    }

    pub fn is_method_not_found(&self) -> bool {
        self.code == codes::METHOD_NOT_FOUND || self.code == codes::UNSUPPORTED_METHOD
    }

    /// Human readable message, `None` when the provider sent an empty one.
    pub fn reason(&self) -> Option<&str> {
        let trimmed = self.message.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

impl From<RpcErrorObject> for ProviderError {
    fn from(value: RpcErrorObject) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<ProviderError> for RpcErrorObject {
    fn from(value: ProviderError) -> Self {
        Self {
            code: value.code,
            message: value.message,
            data: None,
        }
    }
}
