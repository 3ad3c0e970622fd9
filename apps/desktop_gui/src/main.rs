use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{load_settings, SettingsOverrides};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::{commands::BackendCommand, runtime::spawn_backend_thread};
use crate::controller::events::UiEvent;
use crate::ui::{app::StartupInfo, DappGuiApp};

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./dapp.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    contract_address: Option<String>,
}

/// `RUST_LOG` when set, otherwise `info`.
fn log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();
    let args = Args::parse();

    let settings = load_settings(
        args.config.as_deref(),
        SettingsOverrides {
            contract_address: args.contract_address,
            rpc_url: args.rpc_url,
        },
    )
    .context("failed to load settings")?;
    let startup = StartupInfo {
        contract_address: settings.binding.address().to_string(),
        rpc_url: settings.rpc_url.to_string(),
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    spawn_backend_thread(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SimpleStorage")
            .with_inner_size([560.0, 380.0])
            .with_min_inner_size([420.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "SimpleStorage",
        options,
        Box::new(|_cc| Ok(Box::new(DappGuiApp::new(cmd_tx, ui_rx, startup)))),
    )
    .map_err(|err| anyhow!("gui terminated: {err}"))
}

#[cfg(test)]
mod tests {
    use super::log_filter;

    #[test]
    fn log_filter_follows_rust_log_and_defaults_to_info() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(log_filter().to_string(), "info");

        std::env::set_var("RUST_LOG", "debug");
        assert_eq!(log_filter().to_string(), "debug");
        std::env::remove_var("RUST_LOG");
    }
}
