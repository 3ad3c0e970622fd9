use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use alloy_primitives::U256;
use shared::{contract::ContractBinding, domain::StoredValue};
use tokio::sync::watch;
use tracing::{debug, warn};
use wallet_provider::WalletProvider;

use crate::error::ClientError;

/// Read-only view of the stored value with a locally cached copy.
pub struct ContractReader {
    provider: Arc<dyn WalletProvider>,
    binding: Arc<ContractBinding>,
    issued: AtomicU64,
    applied: Mutex<u64>,
    value: watch::Sender<StoredValue>,
}

impl ContractReader {
    pub fn new(provider: Arc<dyn WalletProvider>, binding: Arc<ContractBinding>) -> Arc<Self> {
        let (value, _) = watch::channel(StoredValue::Loading);
        Arc::new(Self {
            provider,
            binding,
            issued: AtomicU64::new(0),
            applied: Mutex::new(0),
            value,
        })
    }

    pub fn current(&self) -> StoredValue {
        *self.value.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<StoredValue> {
        self.value.subscribe()
    }

    /// One `getValue()` call, without touching the cache.
    pub async fn read(&self) -> Result<U256, ClientError> {
        let output = self
            .provider
            .call(&self.binding.read_request())
            .await
            .map_err(ClientError::read_failed)?;
        self.binding
            .decode_read_output(&output)
            .map_err(ClientError::read_failed)
    }

    /// Re-reads the value and swaps it into the cache in one step. A failed
    /// read puts the cache back into `Loading`.
    ///
    /// The refresh is ordered when this is called, not when the future is
    /// first polled; a completion that arrives after a later-issued refresh
    /// has already landed is dropped.
    pub fn refresh(&self) -> impl Future<Output = Result<U256, ClientError>> + Send + '_ {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            let result = self.read().await;
            let next = match &result {
                Ok(value) => StoredValue::Ready {
                    value: *value,
                    stale: false,
                },
                Err(err) => {
                    warn!(sequence, "read: stored value unavailable: {err}");
                    StoredValue::Loading
                }
            };

            let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
            if *applied > sequence {
                debug!(sequence, "read: dropped out-of-order completion");
            } else {
                *applied = sequence;
                self.value.send_replace(next);
            }
            drop(applied);
            result
        }
    }

    /// Flags the cached value as outdated after a successful write.
    pub fn mark_stale(&self) {
        self.value.send_if_modified(|value| match value {
            StoredValue::Ready { stale, .. } if !*stale => {
                *stale = true;
                true
            }
            _ => false,
        });
    }
}

#[cfg(test)]
#[path = "tests/reader_tests.rs"]
mod tests;
