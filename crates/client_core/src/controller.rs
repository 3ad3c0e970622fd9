use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use futures::{
    stream::{self, BoxStream},
    StreamExt,
};
use shared::{
    contract::ContractBinding,
    domain::{shorten_address, ChainId, StoredValue},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::Duration,
};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};
use wallet_provider::WalletProvider;

use crate::{
    config::Settings,
    connector::ChainConnector,
    error::ClientError,
    network_guard::{self, NetworkStatus, WRONG_NETWORK_ADVISORY},
    reader::ContractReader,
    writer::{self, ContractWriter, WriteOutcome},
};

pub const STATUS_INVALID_INPUT: &str = "Invalid input value";
pub const STATUS_SUBMITTED: &str = "Transaction submitted...";
pub const STATUS_SUCCESS: &str = "Transaction success";
pub const STATUS_FAILED_FALLBACK: &str = "Transaction failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(NetworkStatus),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WriteState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Success,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    ConnectionChanged(ConnectionState),
    StoredValueChanged(StoredValue),
    PendingChanged(bool),
    WriteStateChanged(WriteState),
    StatusChanged(Option<String>),
    InputChanged(String),
}

/// Everything a front end needs to render one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub connection: ConnectionState,
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub stored_value: StoredValue,
    pub input: String,
    pub write_state: WriteState,
    pub status: Option<String>,
    pub write_pending: bool,
}

impl ControllerSnapshot {
    pub fn is_connected(&self) -> bool {
        matches!(self.connection, ConnectionState::Connected(_))
    }

    pub fn write_enabled(&self) -> bool {
        matches!(
            self.connection,
            ConnectionState::Connected(NetworkStatus::Ok(_))
        ) && !self.write_pending
    }

    pub fn advisory(&self) -> Option<&'static str> {
        match self.connection {
            ConnectionState::Connected(NetworkStatus::Wrong(_)) => Some(WRONG_NETWORK_ADVISORY),
            _ => None,
        }
    }

    pub fn connect_label(&self) -> &'static str {
        match self.connection {
            ConnectionState::Connecting => "Connecting...",
            _ => "Connect Wallet",
        }
    }

    pub fn write_label(&self) -> &'static str {
        if self.write_pending {
            "Updating..."
        } else {
            "Set Value"
        }
    }

    pub fn account_display(&self) -> Option<String> {
        self.account.as_ref().map(shorten_address)
    }

    pub fn stored_value_display(&self) -> String {
        self.stored_value.display()
    }
}

struct ControllerState {
    input: String,
    write_state: WriteState,
    status: Option<String>,
    session_epoch: u64,
}

/// Owns user input and the status line and sequences connect, read and
/// write against the chain collaborators.
///
/// Input, status and write-state changes are announced directly. Connection,
/// stored-value and pending-flag changes come from the collaborators' own
/// state and are announced by [`spawn_background_tasks`](Self::spawn_background_tasks).
pub struct InteractionController {
    connector: Arc<ChainConnector>,
    reader: Arc<ContractReader>,
    writer: Arc<ContractWriter>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl InteractionController {
    pub fn new(settings: &Settings, provider: Arc<dyn WalletProvider>) -> Arc<Self> {
        Self::with_binding(
            Arc::clone(&settings.binding),
            provider,
            settings.receipt_poll_interval,
        )
    }

    pub fn with_binding(
        binding: Arc<ContractBinding>,
        provider: Arc<dyn WalletProvider>,
        receipt_poll_interval: Duration,
    ) -> Arc<Self> {
        Self::new_with_dependencies(
            ChainConnector::new(Arc::clone(&provider)),
            ContractReader::new(Arc::clone(&provider), Arc::clone(&binding)),
            ContractWriter::new(provider, binding, receipt_poll_interval),
        )
    }

    pub fn new_with_dependencies(
        connector: Arc<ChainConnector>,
        reader: Arc<ContractReader>,
        writer: Arc<ContractWriter>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            connector,
            reader,
            writer,
            inner: Mutex::new(ControllerState {
                input: String::new(),
                write_state: WriteState::Idle,
                status: None,
                session_epoch: 0,
            }),
            events,
        })
    }

    pub fn connector(&self) -> &Arc<ChainConnector> {
        &self.connector
    }

    pub fn reader(&self) -> &Arc<ContractReader> {
        &self.reader
    }

    pub fn writer(&self) -> &Arc<ContractWriter> {
        &self.writer
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Derived on every call from the connector's live values.
    pub fn connection_state(&self) -> ConnectionState {
        let session = self.connector.session();
        if session.is_connected() {
            ConnectionState::Connected(NetworkStatus::evaluate(self.connector.chain_id()))
        } else if session.pending {
            ConnectionState::Connecting
        } else {
            ConnectionState::Disconnected
        }
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let guard = self.inner.lock().await;
        ControllerSnapshot {
            connection: self.connection_state(),
            account: self.connector.account(),
            chain_id: self.connector.chain_id(),
            stored_value: self.reader.current(),
            input: guard.input.clone(),
            write_state: guard.write_state.clone(),
            status: guard.status.clone(),
            write_pending: self.writer.is_pending(),
        }
    }

    /// A rejected connection leaves no status message behind.
    pub async fn connect(&self) -> Result<Address, ClientError> {
        self.connector.connect().await
    }

    pub async fn disconnect(&self) {
        self.connector.disconnect();
        self.reset_write_state().await;
    }

    pub async fn set_input(&self, raw: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        guard.input = raw.into();
        self.emit(ControllerEvent::InputChanged(guard.input.clone()));
        if guard.write_state != WriteState::Submitting {
            self.set_write_state(&mut guard, WriteState::Idle);
        }
    }

    pub async fn refresh_value(&self) -> Result<U256, ClientError> {
        self.reader.refresh().await
    }

    /// Validates the current input and runs one write to completion.
    ///
    /// Gate failures (`NotConnected`, `WrongNetwork`, `AlreadyPending`) leave
    /// every piece of state untouched. On success the input is cleared and
    /// the stored value is re-read before this returns.
    pub async fn submit(&self) -> Result<B256, ClientError> {
        let (ticket, account, value, epoch) = {
            let mut guard = self.inner.lock().await;

            let account = self.connector.account().ok_or(ClientError::NotConnected)?;
            let chain_id = self.connector.chain_id();
            if !network_guard::is_allowed(chain_id) {
                return Err(ClientError::WrongNetwork(chain_id.map(|chain| chain.0)));
            }
            if self.writer.is_pending() {
                debug!("write: submit ignored while a transaction is pending");
                return Err(ClientError::AlreadyPending);
            }

            self.set_write_state(&mut guard, WriteState::Validating);
            let value = match writer::parse_value(&guard.input) {
                Ok(value) => value,
                Err(err) => {
                    info!(input = %guard.input, "write: rejected invalid input");
                    self.set_write_state(
                        &mut guard,
                        WriteState::Failed(STATUS_INVALID_INPUT.to_string()),
                    );
                    self.set_status(&mut guard, Some(STATUS_INVALID_INPUT.to_string()));
                    return Err(err);
                }
            };

            let ticket = match self.writer.try_begin() {
                Ok(ticket) => ticket,
                Err(err) => {
                    self.set_write_state(&mut guard, WriteState::Idle);
                    return Err(err);
                }
            };
            self.set_status(&mut guard, Some(STATUS_SUBMITTED.to_string()));
            self.set_write_state(&mut guard, WriteState::Submitting);
            (ticket, account, value, guard.session_epoch)
        };

        let outcome = ticket.submit(account, value).await;

        // The ticket holds the pending slot until the outcome is recorded, so
        // a second submit cannot start in between.
        let mut guard = self.inner.lock().await;
        if guard.session_epoch != epoch {
            drop(ticket);
            info!("write: completion arrived after session reset, not reporting");
            return match outcome {
                WriteOutcome::Success { tx_hash } => Ok(tx_hash),
                WriteOutcome::Failure { cause } => Err(ClientError::WriteFailed(
                    cause.unwrap_or_else(|| STATUS_FAILED_FALLBACK.to_string()),
                )),
            };
        }

        match outcome {
            WriteOutcome::Success { tx_hash } => {
                self.set_status(&mut guard, Some(STATUS_SUCCESS.to_string()));
                guard.input.clear();
                self.emit(ControllerEvent::InputChanged(String::new()));
                self.set_write_state(&mut guard, WriteState::Success);
                drop(ticket);
                drop(guard);

                self.reader.mark_stale();
                if let Err(err) = self.reader.refresh().await {
                    warn!("write: refresh after success failed: {err}");
                }
                Ok(tx_hash)
            }
            WriteOutcome::Failure { cause } => {
                let message = cause.unwrap_or_else(|| STATUS_FAILED_FALLBACK.to_string());
                self.set_status(&mut guard, Some(message.clone()));
                self.set_write_state(&mut guard, WriteState::Failed(message.clone()));
                drop(ticket);
                Err(ClientError::WriteFailed(message))
            }
        }
    }

    /// Starts the provider event listener and the task that republishes
    /// collaborator state changes as [`ControllerEvent`]s.
    pub fn spawn_background_tasks(self: &Arc<Self>) -> BackgroundTasks {
        let listener = self.connector.spawn_event_listener();

        // Subscribed here, not inside the task, so changes applied before the
        // task first runs are still seen.
        let triggers: Vec<BoxStream<'static, Trigger>> = vec![
            WatchStream::from_changes(self.connector.watch_session())
                .map(|_| Trigger::Connection)
                .boxed(),
            WatchStream::from_changes(self.connector.watch_chain_id())
                .map(|_| Trigger::Connection)
                .boxed(),
            WatchStream::from_changes(self.reader.watch())
                .map(Trigger::StoredValue)
                .boxed(),
            WatchStream::from_changes(self.writer.watch_pending())
                .map(Trigger::Pending)
                .boxed(),
        ];
        let mut triggers = stream::select_all(triggers);
        let mut was_connected = self.connector.session().is_connected();

        let controller = Arc::clone(self);
        let forwarder = tokio::spawn(async move {
            while let Some(trigger) = triggers.next().await {
                match trigger {
                    Trigger::Connection => {
                        let state = controller.connection_state();
                        let connected = matches!(state, ConnectionState::Connected(_));
                        if was_connected && !connected {
                            controller.reset_write_state().await;
                        }
                        was_connected = connected;
                        controller.emit(ControllerEvent::ConnectionChanged(state));
                    }
                    Trigger::StoredValue(value) => {
                        controller.emit(ControllerEvent::StoredValueChanged(value));
                    }
                    Trigger::Pending(pending) => {
                        controller.emit(ControllerEvent::PendingChanged(pending));
                    }
                }
            }
        });

        BackgroundTasks {
            handles: vec![listener, forwarder],
        }
    }

    async fn reset_write_state(&self) {
        let mut guard = self.inner.lock().await;
        guard.session_epoch += 1;
        self.set_write_state(&mut guard, WriteState::Idle);
        self.set_status(&mut guard, None);
    }

    fn set_write_state(&self, state: &mut ControllerState, write_state: WriteState) {
        if state.write_state == write_state {
            return;
        }
        state.write_state = write_state.clone();
        self.emit(ControllerEvent::WriteStateChanged(write_state));
    }

    fn set_status(&self, state: &mut ControllerState, status: Option<String>) {
        if state.status == status {
            return;
        }
        state.status = status.clone();
        self.emit(ControllerEvent::StatusChanged(status));
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }
}

enum Trigger {
    Connection,
    StoredValue(StoredValue),
    Pending(bool),
}

/// Handles of the tasks started by
/// [`InteractionController::spawn_background_tasks`]; aborted on drop.
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
