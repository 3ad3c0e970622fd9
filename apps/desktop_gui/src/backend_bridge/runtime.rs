//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{ClientError, InteractionController, Settings};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::sync::broadcast::error::RecvError;
use wallet_provider::JsonRpcWalletProvider;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn spawn_backend_thread(
    settings: Settings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let provider = JsonRpcWalletProvider::new(settings.rpc_url.as_str());
        let controller = InteractionController::new(&settings, provider.clone());

        let (_poller, _tasks) = runtime.block_on(async {
            let poller = provider.spawn_event_poller(settings.chain_poll_interval);
            let tasks = controller.spawn_background_tasks();
            spawn_snapshot_forwarder(Arc::clone(&controller), ui_tx.clone());
            (poller, tasks)
        });
        tracing::info!(rpc_url = %settings.rpc_url, "backend: worker ready");
        publish_snapshot(&runtime, &controller, &ui_tx);
        let _ = ui_tx.try_send(UiEvent::Info(format!("Using node {}", settings.rpc_url)));
        spawn_refresh(&runtime, &controller, &ui_tx);

        while let Ok(cmd) = cmd_rx.recv() {
            tracing::debug!(command = cmd.name(), "backend: handling command");
            match cmd {
                BackendCommand::Connect => {
                    let controller = Arc::clone(&controller);
                    let ui_tx = ui_tx.clone();
                    runtime.spawn(async move {
                        match controller.connect().await {
                            Ok(account) => {
                                tracing::info!(%account, "backend: wallet connected");
                                if let Err(err) = controller.refresh_value().await {
                                    tracing::warn!("backend: read after connect failed: {err}");
                                }
                            }
                            Err(err) => forward_failure(&ui_tx, UiErrorContext::Connect, &err),
                        }
                    });
                }
                BackendCommand::Disconnect => {
                    runtime.block_on(controller.disconnect());
                }
                // Applied in order on this thread so a later edit can never be
                // overtaken by an earlier one.
                BackendCommand::EditInput(text) => {
                    runtime.block_on(controller.set_input(text));
                }
                BackendCommand::Submit => {
                    let controller = Arc::clone(&controller);
                    let ui_tx = ui_tx.clone();
                    runtime.spawn(async move {
                        match controller.submit().await {
                            Ok(tx_hash) => tracing::info!(%tx_hash, "backend: write confirmed"),
                            Err(err) => forward_failure(&ui_tx, UiErrorContext::Submit, &err),
                        }
                    });
                }
                BackendCommand::Refresh => spawn_refresh(&runtime, &controller, &ui_tx),
            }
        }
        tracing::info!("backend: command channel closed, worker exiting");
    })
}

fn spawn_refresh(
    runtime: &tokio::runtime::Runtime,
    controller: &Arc<InteractionController>,
    ui_tx: &Sender<UiEvent>,
) {
    let controller = Arc::clone(controller);
    let ui_tx = ui_tx.clone();
    runtime.spawn(async move {
        if let Err(err) = controller.refresh_value().await {
            forward_failure(&ui_tx, UiErrorContext::Refresh, &err);
        }
    });
}

/// Passes a controller failure to the UI unless it is already visible there
/// or is meant to recover silently.
fn forward_failure(ui_tx: &Sender<UiEvent>, context: UiErrorContext, err: &ClientError) {
    match err {
        // The connect control is usable again and the value shows its
        // placeholder; neither leaves a message behind.
        ClientError::ConnectionRejected(_) | ClientError::ReadFailed(_) => {
            tracing::warn!(?context, "backend: {err}");
        }
        // Already on the controller's status line.
        ClientError::InvalidInput | ClientError::WriteFailed(_) => {}
        ClientError::NotConnected | ClientError::WrongNetwork(_) | ClientError::AlreadyPending => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client_error(context, err)));
        }
    }
}

fn publish_snapshot(
    runtime: &tokio::runtime::Runtime,
    controller: &InteractionController,
    ui_tx: &Sender<UiEvent>,
) {
    let snapshot = runtime.block_on(controller.snapshot());
    let _ = ui_tx.try_send(UiEvent::Snapshot(snapshot));
}

/// Every controller event is answered with a fresh snapshot; the UI only
/// ever renders whole snapshots.
fn spawn_snapshot_forwarder(controller: Arc<InteractionController>, ui_tx: Sender<UiEvent>) {
    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
            let snapshot = controller.snapshot().await;
            match ui_tx.try_send(UiEvent::Snapshot(snapshot)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::debug!("backend: ui queue full, dropping snapshot");
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn rejected_connect_is_only_logged() {
        let (ui_tx, ui_rx) = bounded(4);
        forward_failure(
            &ui_tx,
            UiErrorContext::Connect,
            &ClientError::ConnectionRejected("User rejected the request.".to_string()),
        );
        assert!(ui_rx.try_recv().is_err());
    }

    #[test]
    fn failed_refresh_leaves_the_ui_untouched() {
        let (ui_tx, ui_rx) = bounded(4);
        forward_failure(
            &ui_tx,
            UiErrorContext::Refresh,
            &ClientError::ReadFailed("execution reverted (code -32000)".to_string()),
        );
        assert!(ui_rx.try_recv().is_err());
    }

    #[test]
    fn status_line_failures_are_not_repeated() {
        let (ui_tx, ui_rx) = bounded(4);
        forward_failure(&ui_tx, UiErrorContext::Submit, &ClientError::InvalidInput);
        forward_failure(
            &ui_tx,
            UiErrorContext::Submit,
            &ClientError::WriteFailed("Transaction failed".to_string()),
        );
        assert!(ui_rx.try_recv().is_err());
    }

    #[test]
    fn gate_failures_reach_the_footer() {
        let (ui_tx, ui_rx) = bounded(4);
        forward_failure(&ui_tx, UiErrorContext::Submit, &ClientError::WrongNetwork(Some(1)));
        match ui_rx.try_recv() {
            Ok(UiEvent::Error(err)) => assert_eq!(err.context(), UiErrorContext::Submit),
            _ => panic!("expected a forwarded error"),
        }
    }
}
