use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use shared::{
    domain::ChainId,
    error::{codes, ProviderError},
    protocol::{
        parse_quantity, JsonRpcRequest, JsonRpcResponse, ProviderEvent, TransactionReceipt,
        TransactionRequest,
    },
};
use tokio::{sync::broadcast, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::WalletProvider;

/// Wallet backed by a JSON-RPC endpoint that manages its own unlocked
/// accounts (a local dev node or a signer proxy).
pub struct JsonRpcWalletProvider {
    http: Client,
    rpc_url: String,
    next_id: AtomicU64,
    events: broadcast::Sender<ProviderEvent>,
}

impl JsonRpcWalletProvider {
    pub fn new(rpc_url: impl Into<String>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            http: Client::new(),
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(1),
            events,
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, "rpc: request");
        let response = self
            .http
            .post(&self.rpc_url)
            .json(&JsonRpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(|err| transport_error(method, err))?
            .error_for_status()
            .map_err(|err| transport_error(method, err))?;
        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|err| transport_error(method, err))?;
        body.into_result()
    }

    async fn request_decoded<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ProviderError> {
        let value = self.request(method, params).await?;
        serde_json::from_value(value).map_err(|err| {
            ProviderError::internal(format!("malformed {method} response: {err}"))
        })
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.request_decoded("eth_accounts", json!([])).await
    }

    /// Polls chain id and accounts and publishes every change as a
    /// [`ProviderEvent`]. The first successful poll only records a baseline.
    pub fn spawn_event_poller(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_chain: Option<ChainId> = None;
            let mut last_accounts: Option<Vec<Address>> = None;
            let mut reachable = true;

            loop {
                ticker.tick().await;

                match provider.chain_id().await {
                    Ok(chain_id) => {
                        reachable = true;
                        if last_chain.is_some_and(|previous| previous != chain_id) {
                            info!(chain_id = chain_id.0, "rpc: chain changed");
                            let _ = provider.events.send(ProviderEvent::ChainChanged(chain_id));
                        }
                        last_chain = Some(chain_id);
                    }
                    Err(err) => {
                        if reachable {
                            warn!("rpc: endpoint unreachable: {err}");
                            let _ = provider.events.send(ProviderEvent::Disconnected {
                                reason: err.message.clone(),
                            });
                        }
                        reachable = false;
                        last_chain = None;
                        continue;
                    }
                }

                match provider.accounts().await {
                    Ok(accounts) => {
                        if last_accounts
                            .as_ref()
                            .is_some_and(|previous| previous != &accounts)
                        {
                            info!(count = accounts.len(), "rpc: accounts changed");
                            let _ = provider
                                .events
                                .send(ProviderEvent::AccountsChanged(accounts.clone()));
                        }
                        last_accounts = Some(accounts);
                    }
                    Err(err) => warn!("rpc: failed to poll accounts: {err}"),
                }
            }
        })
    }
}

fn transport_error(method: &str, err: reqwest::Error) -> ProviderError {
    ProviderError::internal(format!("{method} transport failure: {err}"))
}

#[async_trait]
impl WalletProvider for JsonRpcWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let accounts = match self
            .request_decoded::<Vec<Address>>("eth_requestAccounts", json!([]))
            .await
        {
            Ok(accounts) => accounts,
            Err(err) if err.is_method_not_found() => {
                debug!("rpc: eth_requestAccounts unsupported, using eth_accounts");
                self.accounts().await?
            }
            Err(err) => return Err(err),
        };

        if accounts.is_empty() {
            return Err(ProviderError::new(
                codes::UNAUTHORIZED,
                "wallet exposed no accounts",
            ));
        }
        Ok(accounts)
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let value = self.request("eth_chainId", json!([])).await?;
        Ok(ChainId(parse_quantity(&value)?))
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, ProviderError> {
        self.request_decoded("eth_call", json!([request, "latest"]))
            .await
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, ProviderError> {
        self.request_decoded("eth_sendTransaction", json!([request]))
            .await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.request_decoded("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/json_rpc_tests.rs"]
mod tests;
