use super::*;
use crate::fake_provider::{user_account, FakeWalletProvider, FUJI, MAINNET};
use shared::error::ProviderError;
use std::time::Duration;

#[tokio::test]
async fn connect_sets_account_and_chain() {
    let provider = FakeWalletProvider::new(FUJI);
    let connector = ChainConnector::new(provider);

    let account = connector.connect().await.expect("connect");

    assert_eq!(account, user_account());
    let session = connector.session();
    assert!(session.is_connected());
    assert!(!session.pending);
    assert_eq!(session.account(), Some(user_account()));
    assert_eq!(connector.chain_id(), Some(ChainId(FUJI)));
}

#[tokio::test]
async fn rejected_connect_leaves_session_unchanged() {
    let provider = FakeWalletProvider::new(FUJI);
    provider.reject_connect(ProviderError::user_rejected());
    let connector = ChainConnector::new(provider);

    let err = connector.connect().await.expect_err("rejected");

    assert_eq!(
        err,
        ClientError::ConnectionRejected("User rejected the request.".to_string())
    );
    assert_eq!(connector.session(), WalletSession::default());
    assert_eq!(connector.chain_id(), None);
}

#[tokio::test]
async fn disconnect_clears_account_and_chain() {
    let provider = FakeWalletProvider::new(MAINNET);
    let connector = ChainConnector::new(provider);
    connector.connect().await.expect("connect");

    connector.disconnect();

    assert_eq!(connector.account(), None);
    assert_eq!(connector.chain_id(), None);
    assert!(!connector.session().is_connected());
}

#[tokio::test]
async fn chain_changes_are_ignored_until_connected() {
    let provider = FakeWalletProvider::new(FUJI);
    let connector = ChainConnector::new(provider);

    connector.apply_provider_event(ProviderEvent::ChainChanged(ChainId(1)));
    assert_eq!(connector.chain_id(), None);

    connector.connect().await.expect("connect");
    connector.apply_provider_event(ProviderEvent::ChainChanged(ChainId(1)));
    assert_eq!(connector.chain_id(), Some(ChainId(1)));
}

#[tokio::test]
async fn empty_accounts_event_ends_the_session() {
    let provider = FakeWalletProvider::new(FUJI);
    let connector = ChainConnector::new(provider);
    connector.connect().await.expect("connect");

    connector.apply_provider_event(ProviderEvent::AccountsChanged(Vec::new()));

    assert!(!connector.session().is_connected());
}

#[tokio::test]
async fn account_switch_updates_the_session() {
    let provider = FakeWalletProvider::new(FUJI);
    let connector = ChainConnector::new(provider);
    connector.connect().await.expect("connect");
    let other = Address::repeat_byte(0xbb);

    connector.apply_provider_event(ProviderEvent::AccountsChanged(vec![other]));

    assert_eq!(connector.account(), Some(other));
}

#[tokio::test]
async fn event_listener_tracks_external_network_switch() {
    let provider = FakeWalletProvider::new(FUJI);
    let connector = ChainConnector::new(provider.clone());
    connector.connect().await.expect("connect");
    let mut chain_rx = connector.watch_chain_id();
    let listener = connector.spawn_event_listener();

    provider.switch_chain(1);

    tokio::time::timeout(Duration::from_secs(1), chain_rx.changed())
        .await
        .expect("chain change within timeout")
        .expect("sender alive");
    assert_eq!(*chain_rx.borrow(), Some(ChainId(1)));
    listener.abort();
}
