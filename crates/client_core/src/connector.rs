use std::sync::Arc;

use alloy_primitives::Address;
use shared::{
    domain::{ChainId, WalletSession},
    protocol::ProviderEvent,
};
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{info, warn};
use wallet_provider::WalletProvider;

use crate::error::ClientError;

/// Wallet session and chain identity, mirrored from the injected provider.
///
/// Both values are published through `watch` channels because the provider
/// may change them at any time, outside of any call made here.
pub struct ChainConnector {
    provider: Arc<dyn WalletProvider>,
    session: watch::Sender<WalletSession>,
    chain_id: watch::Sender<Option<ChainId>>,
}

impl ChainConnector {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Arc<Self> {
        let (session, _) = watch::channel(WalletSession::default());
        let (chain_id, _) = watch::channel(None);
        Arc::new(Self {
            provider,
            session,
            chain_id,
        })
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    pub fn session(&self) -> WalletSession {
        self.session.borrow().clone()
    }

    pub fn account(&self) -> Option<Address> {
        self.session.borrow().account()
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        *self.chain_id.borrow()
    }

    pub fn watch_session(&self) -> watch::Receiver<WalletSession> {
        self.session.subscribe()
    }

    pub fn watch_chain_id(&self) -> watch::Receiver<Option<ChainId>> {
        self.chain_id.subscribe()
    }

    /// Requests a wallet session. On rejection the previous session is left
    /// as it was, apart from the pending flag.
    pub async fn connect(&self) -> Result<Address, ClientError> {
        if let Some(account) = self.account() {
            return Ok(account);
        }

        self.session.send_modify(|session| session.pending = true);

        let accounts = match self.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                self.session.send_modify(|session| session.pending = false);
                warn!(code = err.code, "wallet: connection rejected: {}", err.message);
                return Err(ClientError::connection_rejected(&err));
            }
        };
        let Some(account) = accounts.first().copied() else {
            self.session.send_modify(|session| session.pending = false);
            warn!("wallet: connection returned no accounts");
            return Err(ClientError::ConnectionRejected(
                "wallet exposed no accounts".to_string(),
            ));
        };

        let chain_id = match self.provider.chain_id().await {
            Ok(chain_id) => Some(chain_id),
            Err(err) => {
                warn!("wallet: chain id unavailable after connect: {err}");
                None
            }
        };

        self.chain_id.send_replace(chain_id);
        self.session.send_replace(WalletSession::connected(account));
        info!(
            %account,
            chain_id = chain_id.map(|chain| chain.0),
            "wallet: connected"
        );
        Ok(account)
    }

    pub fn disconnect(&self) {
        let was_connected = self.session.borrow().is_connected();
        self.session.send_replace(WalletSession::default());
        self.chain_id.send_replace(None);
        if was_connected {
            info!("wallet: disconnected");
        }
    }

    /// Applies a provider notification to the mirrored state.
    pub fn apply_provider_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                if !self.session.borrow().is_connected() {
                    return;
                }
                match accounts.first().copied() {
                    Some(account) => {
                        let changed = self.session.send_if_modified(|session| {
                            if session.account() == Some(account) {
                                return false;
                            }
                            *session = WalletSession::connected(account);
                            true
                        });
                        if changed {
                            info!(%account, "wallet: active account changed");
                        }
                    }
                    None => self.disconnect(),
                }
            }
            ProviderEvent::ChainChanged(chain_id) => {
                if !self.session.borrow().is_connected() {
                    return;
                }
                let changed = self.chain_id.send_if_modified(|current| {
                    if *current == Some(chain_id) {
                        return false;
                    }
                    *current = Some(chain_id);
                    true
                });
                if changed {
                    info!(chain_id = chain_id.0, "wallet: chain changed");
                }
            }
            ProviderEvent::Disconnected { reason } => {
                warn!("wallet: provider disconnected: {reason}");
                self.disconnect();
            }
        }
    }

    /// Forwards provider notifications into this connector until the
    /// provider's event channel closes.
    pub fn spawn_event_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let connector = Arc::clone(self);
        let mut events = self.provider.subscribe_events();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => connector.apply_provider_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "wallet: provider events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/connector_tests.rs"]
mod tests;
