use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

const ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn temp_settings_file(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("storage_dapp_settings_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(SETTINGS_FILE);
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn missing_contract_address_is_fatal() {
    let err = load_settings_with_env(None, SettingsOverrides::default(), env_from(&[]))
        .expect_err("must fail");
    assert!(matches!(err, SettingsError::MissingContractAddress));
}

#[test]
fn blank_contract_address_counts_as_missing() {
    let err = load_settings_with_env(
        None,
        SettingsOverrides::default(),
        env_from(&[("CONTRACT_ADDRESS", "   ")]),
    )
    .expect_err("must fail");
    assert!(matches!(err, SettingsError::MissingContractAddress));
}

#[test]
fn malformed_contract_address_is_rejected() {
    let err = load_settings_with_env(
        None,
        SettingsOverrides::default(),
        env_from(&[("CONTRACT_ADDRESS", "0x1234")]),
    )
    .expect_err("must fail");
    assert!(matches!(err, SettingsError::InvalidContractAddress { .. }));
}

#[test]
fn env_address_uses_defaults_for_the_rest() {
    let settings = load_settings_with_env(
        None,
        SettingsOverrides::default(),
        env_from(&[("CONTRACT_ADDRESS", ADDRESS)]),
    )
    .expect("settings");

    assert_eq!(
        settings.binding.address(),
        ADDRESS.parse::<Address>().expect("address")
    );
    assert_eq!(settings.rpc_url.as_str(), "http://127.0.0.1:8545/");
    assert_eq!(settings.receipt_poll_interval, Duration::from_millis(1_000));
    assert_eq!(settings.chain_poll_interval, Duration::from_millis(2_000));
}

#[test]
fn file_values_are_overridden_by_env_then_cli() {
    let path = temp_settings_file(&format!(
        "contract_address = \"{ADDRESS}\"\nrpc_url = \"http://file.example:8545\"\nreceipt_poll_interval_ms = 250\n"
    ));

    let settings = load_settings_with_env(
        Some(&path),
        SettingsOverrides::default(),
        env_from(&[("APP__RPC_URL", "https://env.example/rpc")]),
    )
    .expect("settings");
    assert_eq!(settings.rpc_url.as_str(), "https://env.example/rpc");
    assert_eq!(settings.receipt_poll_interval, Duration::from_millis(250));

    let settings = load_settings_with_env(
        Some(&path),
        SettingsOverrides {
            contract_address: None,
            rpc_url: Some("http://cli.example:9650/ext/bc/C/rpc".to_string()),
        },
        env_from(&[("APP__RPC_URL", "https://env.example/rpc")]),
    )
    .expect("settings");
    assert_eq!(
        settings.rpc_url.as_str(),
        "http://cli.example:9650/ext/bc/C/rpc"
    );

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let path = env::temp_dir().join("storage_dapp_settings_test_does_not_exist.toml");
    let err = load_settings_with_env(
        Some(&path),
        SettingsOverrides::default(),
        env_from(&[("CONTRACT_ADDRESS", ADDRESS)]),
    )
    .expect_err("must fail");
    assert!(matches!(err, SettingsError::ReadFile { .. }));
}

#[test]
fn non_http_rpc_url_is_rejected() {
    let err = load_settings_with_env(
        None,
        SettingsOverrides::default(),
        env_from(&[("CONTRACT_ADDRESS", ADDRESS), ("RPC_URL", "ws://127.0.0.1:8546")]),
    )
    .expect_err("must fail");
    assert!(matches!(err, SettingsError::InvalidRpcUrl { .. }));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let err = load_settings_with_env(
        None,
        SettingsOverrides::default(),
        env_from(&[
            ("CONTRACT_ADDRESS", ADDRESS),
            ("APP__CHAIN_POLL_INTERVAL_MS", "0"),
        ]),
    )
    .expect_err("must fail");
    assert!(matches!(
        err,
        SettingsError::InvalidInterval {
            key: "APP__CHAIN_POLL_INTERVAL_MS",
            ..
        }
    ));
}
