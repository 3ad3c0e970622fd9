use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_primitives::{Address, B256, U256};
use shared::contract::ContractBinding;
use tokio::sync::watch;
use tracing::{info, warn};
use wallet_provider::WalletProvider;

use crate::error::ClientError;

pub const REVERTED_REASON: &str = "Transaction reverted";

/// Parses raw user input into the uint256 argument of `setValue`.
///
/// Accepts decimal digits or a `0x` hex literal after trimming whitespace.
pub fn parse_value(raw: &str) -> Result<U256, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ClientError::InvalidInput);
    }

    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            U256::from_str_radix(hex, 16).ok()
        }
        Some(_) => None,
        None if raw.bytes().all(|b| b.is_ascii_digit()) => U256::from_str(raw).ok(),
        None => None,
    };
    parsed.ok_or(ClientError::InvalidInput)
}

/// Terminal result of one submission. Produced exactly once per `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Success { tx_hash: B256 },
    Failure { cause: Option<String> },
}

/// Issues `setValue` transactions, at most one at a time.
pub struct ContractWriter {
    provider: Arc<dyn WalletProvider>,
    binding: Arc<ContractBinding>,
    receipt_poll_interval: Duration,
    pending: AtomicBool,
    pending_watch: watch::Sender<bool>,
}

impl ContractWriter {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        binding: Arc<ContractBinding>,
        receipt_poll_interval: Duration,
    ) -> Arc<Self> {
        let (pending_watch, _) = watch::channel(false);
        Arc::new(Self {
            provider,
            binding,
            receipt_poll_interval,
            pending: AtomicBool::new(false),
            pending_watch,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn watch_pending(&self) -> watch::Receiver<bool> {
        self.pending_watch.subscribe()
    }

    /// Claims the single submission slot. Fails with `AlreadyPending` while
    /// another ticket is alive.
    pub fn try_begin(&self) -> Result<WriteTicket<'_>, ClientError> {
        self.pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ClientError::AlreadyPending)?;
        self.pending_watch.send_replace(true);
        Ok(WriteTicket { writer: self })
    }

    /// Convenience for callers that have not claimed a ticket yet.
    pub async fn submit(&self, from: Address, value: U256) -> Result<WriteOutcome, ClientError> {
        let ticket = self.try_begin()?;
        Ok(ticket.submit(from, value).await)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> WriteOutcome {
        loop {
            match self.provider.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) if receipt.succeeded() => {
                    info!(%tx_hash, "write: transaction mined");
                    return WriteOutcome::Success { tx_hash };
                }
                Ok(Some(_)) => {
                    warn!(%tx_hash, "write: transaction reverted");
                    return WriteOutcome::Failure {
                        cause: Some(REVERTED_REASON.to_string()),
                    };
                }
                Ok(None) => tokio::time::sleep(self.receipt_poll_interval).await,
                Err(err) => {
                    warn!(%tx_hash, "write: receipt lookup failed: {err}");
                    return WriteOutcome::Failure {
                        cause: err.reason().map(str::to_string),
                    };
                }
            }
        }
    }
}

/// Proof that the caller holds the writer's only submission slot. The slot is
/// released when the ticket is dropped, not when `submit` returns, so the
/// caller can record the outcome before another write may begin.
pub struct WriteTicket<'a> {
    writer: &'a ContractWriter,
}

impl WriteTicket<'_> {
    /// Sends the transaction and waits until the provider reports it mined
    /// or failed. There is no timeout; the wait lasts as long as the
    /// provider keeps answering "not yet mined".
    pub async fn submit(&self, from: Address, value: U256) -> WriteOutcome {
        let writer = self.writer;
        let request = writer.binding.write_request(from, value);
        info!(%from, %value, "write: submitting setValue");

        match writer.provider.send_transaction(&request).await {
            Ok(tx_hash) => {
                info!(%tx_hash, "write: transaction accepted");
                writer.wait_for_receipt(tx_hash).await
            }
            Err(err) => {
                warn!(code = err.code, "write: transaction rejected: {}", err.message);
                WriteOutcome::Failure {
                    cause: err.reason().map(str::to_string),
                }
            }
        }
    }
}

impl Drop for WriteTicket<'_> {
    fn drop(&mut self) {
        self.writer.pending.store(false, Ordering::SeqCst);
        self.writer.pending_watch.send_replace(false);
    }
}

#[cfg(test)]
#[path = "tests/writer_tests.rs"]
mod tests;
