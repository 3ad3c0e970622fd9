//! Write eligibility by chain. Reads and wallet connection are never gated.

use shared::domain::{ChainId, KnownNetwork};

pub const WRONG_NETWORK_ADVISORY: &str = "Switch to Avalanche Fuji or Mainnet";

pub fn is_allowed(chain_id: Option<ChainId>) -> bool {
    chain_id.is_some_and(|chain_id| KnownNetwork::from_chain_id(chain_id).is_some())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Ok(KnownNetwork),
    Wrong(Option<ChainId>),
}

impl NetworkStatus {
    pub fn evaluate(chain_id: Option<ChainId>) -> Self {
        match chain_id.and_then(KnownNetwork::from_chain_id) {
            Some(network) => NetworkStatus::Ok(network),
            None => NetworkStatus::Wrong(chain_id),
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, NetworkStatus::Ok(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fuji_and_mainnet_are_allowed() {
        assert!(is_allowed(Some(ChainId(43113))));
        assert!(is_allowed(Some(ChainId(43114))));
        for other in [0, 1, 5, 137, 43112, 43115, u64::MAX] {
            assert!(!is_allowed(Some(ChainId(other))), "chain {other}");
        }
    }

    #[test]
    fn unknown_chain_is_not_allowed() {
        assert!(!is_allowed(None));
        assert_eq!(NetworkStatus::evaluate(None), NetworkStatus::Wrong(None));
    }

    #[test]
    fn evaluate_agrees_with_is_allowed() {
        for id in [1, 43113, 43114, 99] {
            let chain = Some(ChainId(id));
            assert_eq!(NetworkStatus::evaluate(chain).is_ok(), is_allowed(chain));
        }
    }
}
