use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use alloy_primitives::Address;
use serde::Deserialize;
use shared::contract::ContractBinding;
use thiserror::Error;
use url::Url;

pub const SETTINGS_FILE: &str = "dapp.toml";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_CHAIN_POLL_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("contract address not configured; set CONTRACT_ADDRESS or contract_address in {SETTINGS_FILE}")]
    MissingContractAddress,
    #[error("invalid contract address '{value}': {reason}")]
    InvalidContractAddress { value: String, reason: String },
    #[error("invalid rpc url '{value}': {reason}")]
    InvalidRpcUrl { value: String, reason: String },
    #[error("invalid value '{value}' for {key}: expected milliseconds")]
    InvalidInterval { key: &'static str, value: String },
    #[error("failed to read settings file '{}': {source}", path.display())]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file '{}': {source}", path.display())]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Resolved startup configuration. The contract binding is fixed for the
/// lifetime of the process and shared by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    pub binding: Arc<ContractBinding>,
    pub rpc_url: Url,
    pub receipt_poll_interval: Duration,
    pub chain_poll_interval: Duration,
}

/// Values supplied on the command line; these win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub contract_address: Option<String>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    contract_address: Option<String>,
    rpc_url: Option<String>,
    receipt_poll_interval_ms: Option<u64>,
    chain_poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct RawSettings {
    contract_address: Option<String>,
    rpc_url: Option<String>,
    receipt_poll_interval_ms: Option<u64>,
    chain_poll_interval_ms: Option<u64>,
}

pub fn load_settings(
    config_path: Option<&Path>,
    overrides: SettingsOverrides,
) -> Result<Settings, SettingsError> {
    load_settings_with_env(config_path, overrides, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_with_env(
    config_path: Option<&Path>,
    overrides: SettingsOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, SettingsError> {
    let mut raw = RawSettings::default();

    let file_cfg = match config_path {
        Some(path) => Some(read_settings_file(path)?),
        None => {
            let default_path = Path::new(SETTINGS_FILE);
            if default_path.exists() {
                Some(read_settings_file(default_path)?)
            } else {
                None
            }
        }
    };
    if let Some(file_cfg) = file_cfg {
        raw.contract_address = file_cfg.contract_address;
        raw.rpc_url = file_cfg.rpc_url;
        raw.receipt_poll_interval_ms = file_cfg.receipt_poll_interval_ms;
        raw.chain_poll_interval_ms = file_cfg.chain_poll_interval_ms;
    }

    if let Some(v) = env("CONTRACT_ADDRESS") {
        raw.contract_address = Some(v);
    }
    if let Some(v) = env("APP__CONTRACT_ADDRESS") {
        raw.contract_address = Some(v);
    }

    if let Some(v) = env("RPC_URL") {
        raw.rpc_url = Some(v);
    }
    if let Some(v) = env("APP__RPC_URL") {
        raw.rpc_url = Some(v);
    }

    if let Some(v) = env("APP__RECEIPT_POLL_INTERVAL_MS") {
        raw.receipt_poll_interval_ms = Some(parse_interval("APP__RECEIPT_POLL_INTERVAL_MS", &v)?);
    }
    if let Some(v) = env("APP__CHAIN_POLL_INTERVAL_MS") {
        raw.chain_poll_interval_ms = Some(parse_interval("APP__CHAIN_POLL_INTERVAL_MS", &v)?);
    }

    if let Some(v) = overrides.contract_address {
        raw.contract_address = Some(v);
    }
    if let Some(v) = overrides.rpc_url {
        raw.rpc_url = Some(v);
    }

    resolve(raw)
}

fn read_settings_file(path: &Path) -> Result<FileSettings, SettingsError> {
    let text = fs::read_to_string(path).map_err(|source| SettingsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| SettingsError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_interval(key: &'static str, value: &str) -> Result<u64, SettingsError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .ok_or_else(|| SettingsError::InvalidInterval {
            key,
            value: value.to_string(),
        })
}

fn resolve(raw: RawSettings) -> Result<Settings, SettingsError> {
    let contract_address = raw
        .contract_address
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(SettingsError::MissingContractAddress)?;
    let address = contract_address.parse::<Address>().map_err(|err| {
        SettingsError::InvalidContractAddress {
            value: contract_address.clone(),
            reason: err.to_string(),
        }
    })?;

    Ok(Settings {
        binding: Arc::new(ContractBinding::new(address)),
        rpc_url: parse_rpc_url(raw.rpc_url.as_deref().unwrap_or(DEFAULT_RPC_URL))?,
        receipt_poll_interval: Duration::from_millis(
            raw.receipt_poll_interval_ms
                .unwrap_or(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
        ),
        chain_poll_interval: Duration::from_millis(
            raw.chain_poll_interval_ms
                .unwrap_or(DEFAULT_CHAIN_POLL_INTERVAL_MS),
        ),
    })
}

fn parse_rpc_url(raw: &str) -> Result<Url, SettingsError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|err| SettingsError::InvalidRpcUrl {
        value: raw.to_string(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SettingsError::InvalidRpcUrl {
            value: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
