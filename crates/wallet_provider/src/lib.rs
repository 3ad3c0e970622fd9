use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use shared::{
    domain::ChainId,
    error::ProviderError,
    protocol::{ProviderEvent, TransactionReceipt, TransactionRequest},
};
use tokio::sync::broadcast;

mod json_rpc;

pub use json_rpc::JsonRpcWalletProvider;

/// Injected wallet: owns the signing key and the link to the ledger.
///
/// Every method may suspend on network I/O. Account and chain changes that
/// happen outside of any request are announced through
/// [`subscribe_events`](WalletProvider::subscribe_events).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the user to expose their accounts. An error here means the
    /// request was declined or the wallet is unreachable.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;
    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, ProviderError>;
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, ProviderError>;
    /// `Ok(None)` while the transaction is not yet mined.
    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError>;
    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent>;
}
