use std::time::Duration;

use client_core::{ConnectionState, ControllerSnapshot, WriteState};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::StoredValue;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiEvent},
    orchestration::dispatch_backend_command,
};

const ADVISORY_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 160, 60);
const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(110, 190, 120);
const FAILURE_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 110, 110);

/// Static facts shown in the header; fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct StartupInfo {
    pub contract_address: String,
    pub rpc_url: String,
}

pub struct DappGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    startup: StartupInfo,
    snapshot: ControllerSnapshot,
    input: String,
    status: String,
    status_banner: Option<String>,
}

fn initial_snapshot() -> ControllerSnapshot {
    ControllerSnapshot {
        connection: ConnectionState::Disconnected,
        account: None,
        chain_id: None,
        stored_value: StoredValue::Loading,
        input: String::new(),
        write_state: WriteState::Idle,
        status: None,
        write_pending: false,
    }
}

impl DappGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupInfo,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            startup,
            snapshot: initial_snapshot(),
            input: String::new(),
            status: "Starting...".to_string(),
            status_banner: None,
        }
    }

    fn queue(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot),
                UiEvent::Error(err) => self.apply_error(err),
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: ControllerSnapshot) {
        // The text box owns the input; the controller only ever replaces it
        // by clearing it after a confirmed write.
        if snapshot.write_state == WriteState::Success
            && self.snapshot.write_state != WriteState::Success
        {
            self.input = snapshot.input.clone();
        }
        if snapshot.is_connected() && !self.snapshot.is_connected() {
            self.status_banner = None;
        }
        self.snapshot = snapshot;
    }

    fn apply_error(&mut self, err: UiError) {
        tracing::warn!(context = ?err.context(), "ui: {}", err.message());
        self.status = err.display();
        if err.wants_banner() {
            self.status_banner = Some(self.status.clone());
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(message) = self.status_banner.clone() {
            egui::Frame::new()
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(8.0);
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("SimpleStorage");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match self.snapshot.connection {
                        ConnectionState::Connected(_) => {
                            if ui.button("Disconnect").clicked() {
                                self.queue(BackendCommand::Disconnect);
                            }
                            if let Some(account) = self.snapshot.account_display() {
                                ui.monospace(account);
                            }
                        }
                        ConnectionState::Connecting | ConnectionState::Disconnected => {
                            let connecting =
                                self.snapshot.connection == ConnectionState::Connecting;
                            let button = egui::Button::new(
                                egui::RichText::new(self.snapshot.connect_label()).strong(),
                            );
                            if ui.add_enabled(!connecting, button).clicked() {
                                self.status_banner = None;
                                self.queue(BackendCommand::Connect);
                            }
                        }
                    }
                });
            });
            ui.add_space(6.0);
        });
    }

    fn show_main_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);

            egui::Grid::new("chain_facts")
                .num_columns(2)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    ui.label("Contract");
                    ui.monospace(&self.startup.contract_address);
                    ui.end_row();
                    ui.label("Node");
                    ui.monospace(&self.startup.rpc_url);
                    ui.end_row();
                    ui.label("Chain");
                    ui.monospace(
                        self.snapshot
                            .chain_id
                            .map(|chain| chain.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                    ui.end_row();
                });

            if let Some(advisory) = self.snapshot.advisory() {
                ui.add_space(6.0);
                ui.colored_label(ADVISORY_COLOR, advisory);
            }

            ui.add_space(16.0);
            ui.horizontal(|ui| {
                ui.label("Stored value:");
                ui.label(
                    egui::RichText::new(self.snapshot.stored_value_display())
                        .monospace()
                        .size(22.0)
                        .strong(),
                );
                if ui.small_button("Refresh").clicked() {
                    self.queue(BackendCommand::Refresh);
                }
            });

            ui.add_space(16.0);
            let write_enabled = self.snapshot.write_enabled();
            ui.horizontal(|ui| {
                let edit = egui::TextEdit::singleline(&mut self.input)
                    .hint_text("New value")
                    .desired_width(260.0);
                let response = ui.add(edit);
                if response.changed() {
                    let text = self.input.clone();
                    self.queue(BackendCommand::EditInput(text));
                }
                let enter_pressed = response.lost_focus()
                    && ui.input(|input| input.key_pressed(egui::Key::Enter));

                let button = egui::Button::new(
                    egui::RichText::new(self.snapshot.write_label()).strong(),
                );
                let clicked = ui.add_enabled(write_enabled, button).clicked();
                if write_enabled && (clicked || enter_pressed) {
                    self.queue(BackendCommand::Submit);
                }
            });

            if let Some(status) = &self.snapshot.status {
                ui.add_space(8.0);
                let color = match &self.snapshot.write_state {
                    WriteState::Success => SUCCESS_COLOR,
                    WriteState::Failed(_) => FAILURE_COLOR,
                    _ => ui.visuals().text_color(),
                };
                ui.colored_label(color, status);
            }
        });
    }

    fn show_footer(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.small(&self.status);
        });
    }
}

impl eframe::App for DappGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_header(ctx);
        self.show_footer(ctx);
        self.show_main_panel(ctx);

        if self.snapshot.write_pending
            || self.snapshot.connection == ConnectionState::Connecting
        {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use client_core::{ClientError, NetworkStatus};
    use crossbeam_channel::bounded;
    use shared::domain::KnownNetwork;

    use crate::controller::events::UiErrorContext;

    fn app() -> (DappGuiApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (ui_tx, ui_rx) = bounded(16);
        let app = DappGuiApp::new(
            cmd_tx,
            ui_rx,
            StartupInfo {
                contract_address: "0x4242".to_string(),
                rpc_url: "http://127.0.0.1:8545/".to_string(),
            },
        );
        (app, cmd_rx, ui_tx)
    }

    fn connected(write_state: WriteState, input: &str) -> ControllerSnapshot {
        ControllerSnapshot {
            connection: ConnectionState::Connected(NetworkStatus::Ok(
                KnownNetwork::AvalancheFuji,
            )),
            input: input.to_string(),
            write_state,
            stored_value: StoredValue::Ready {
                value: U256::from(5u64),
                stale: false,
            },
            ..initial_snapshot()
        }
    }

    #[test]
    fn input_is_cleared_only_when_a_write_succeeds() {
        let (mut app, _cmd_rx, ui_tx) = app();
        app.input = "42".to_string();

        ui_tx
            .send(UiEvent::Snapshot(connected(WriteState::Submitting, "")))
            .expect("send");
        app.process_ui_events();
        assert_eq!(app.input, "42");

        ui_tx
            .send(UiEvent::Snapshot(connected(WriteState::Success, "")))
            .expect("send");
        app.process_ui_events();
        assert_eq!(app.input, "");
        assert_eq!(app.snapshot.stored_value_display(), "5");
    }

    #[test]
    fn connect_rejection_leaves_no_banner() {
        let (mut app, _cmd_rx, ui_tx) = app();
        ui_tx
            .send(UiEvent::Error(UiError::from_client_error(
                UiErrorContext::Connect,
                &ClientError::ConnectionRejected("User rejected the request.".to_string()),
            )))
            .expect("send");

        app.process_ui_events();

        assert!(app.status_banner.is_none());
    }

    #[test]
    fn startup_failure_raises_banner_and_footer() {
        let (mut app, _cmd_rx, ui_tx) = app();
        ui_tx
            .send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                "backend worker startup failure: failed to build runtime",
            )))
            .expect("send");

        app.process_ui_events();

        assert!(app.status_banner.is_some());
        assert!(app.status.contains("failed to build runtime"));
    }

    #[test]
    fn queued_commands_reach_the_backend_channel() {
        let (mut app, cmd_rx, _ui_tx) = app();
        app.queue(BackendCommand::EditInput("7".to_string()));
        app.queue(BackendCommand::Submit);
        assert_eq!(
            cmd_rx.try_recv().ok(),
            Some(BackendCommand::EditInput("7".to_string()))
        );
        assert_eq!(cmd_rx.try_recv().ok(), Some(BackendCommand::Submit));
    }
}
