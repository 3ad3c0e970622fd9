use std::fmt;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ChainId);

/// Networks the storage contract is deployed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownNetwork {
    AvalancheFuji,
    AvalancheMainnet,
}

impl KnownNetwork {
    pub const ALL: [KnownNetwork; 2] = [KnownNetwork::AvalancheFuji, KnownNetwork::AvalancheMainnet];

    pub fn chain_id(self) -> ChainId {
        match self {
            KnownNetwork::AvalancheFuji => ChainId(43113),
            KnownNetwork::AvalancheMainnet => ChainId(43114),
        }
    }

    pub fn from_chain_id(chain_id: ChainId) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|network| network.chain_id() == chain_id)
    }

    pub fn label(self) -> &'static str {
        match self {
            KnownNetwork::AvalancheFuji => "Avalanche Fuji",
            KnownNetwork::AvalancheMainnet => "Avalanche Mainnet",
        }
    }
}

/// Wallet session as seen by the client. `account` is set iff `connected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    account: Option<Address>,
    pub pending: bool,
}

impl WalletSession {
    pub fn connected(account: Address) -> Self {
        Self {
            account: Some(account),
            pending: false,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }
}

/// Locally cached mirror of the on-chain value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoredValue {
    #[default]
    Loading,
    Ready {
        value: U256,
        stale: bool,
    },
}

impl StoredValue {
    pub const PLACEHOLDER: &'static str = "...";

    pub fn value(&self) -> Option<U256> {
        match self {
            StoredValue::Loading => None,
            StoredValue::Ready { value, .. } => Some(*value),
        }
    }

    pub fn display(&self) -> String {
        match self {
            StoredValue::Loading => Self::PLACEHOLDER.to_string(),
            StoredValue::Ready { value, .. } => value.to_string(),
        }
    }
}

pub fn shorten_address(address: &Address) -> String {
    let full = address.to_string();
    if full.len() <= 10 {
        return full;
    }
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
