use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{load_settings, ClientError, InteractionController, SettingsOverrides};
use tracing::info;
use wallet_provider::{JsonRpcWalletProvider, WalletProvider};

#[derive(Parser, Debug)]
#[command(about = "Read and update the SimpleStorage value from a terminal")]
struct Args {
    /// Settings file; defaults to ./dapp.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    contract_address: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored value.
    Show,
    /// Connect the node's first account and store a new value.
    Set { value: String },
}

/// `RUST_LOG` when set, otherwise `info`.
fn log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
}

#[tokio::main]
async fn main() -> Result<()> {
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
    info!(
        contract = %settings.binding.address(),
        rpc_url = %settings.rpc_url,
        "cli: settings loaded"
    );

    let provider: Arc<dyn WalletProvider> = JsonRpcWalletProvider::new(settings.rpc_url.as_str());
    let controller = InteractionController::new(&settings, provider);

    match args.command {
        Command::Show => {
            // A failed read leaves the placeholder in place.
            let _ = controller.refresh_value().await;
            println!("{}", controller.snapshot().await.stored_value_display());
        }
        Command::Set { value } => {
            let account = controller
                .connect()
                .await
                .context("wallet connection failed")?;
            let snapshot = controller.snapshot().await;
            println!(
                "Connected {} on chain {}",
                snapshot.account_display().unwrap_or_else(|| account.to_string()),
                snapshot
                    .chain_id
                    .map(|chain| chain.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );
            if let Some(advisory) = snapshot.advisory() {
                bail!("{advisory}");
            }

            controller.set_input(value).await;
            let result = controller.submit().await;
            let snapshot = controller.snapshot().await;
            if let Some(status) = &snapshot.status {
                println!("{status}");
            }
            match result {
                Ok(tx_hash) => {
                    println!("tx {tx_hash}");
                    println!("Stored value: {}", snapshot.stored_value_display());
                }
                Err(ClientError::InvalidInput) | Err(ClientError::WriteFailed(_)) => {
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
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
