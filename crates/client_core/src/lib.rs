//! Contract-interaction core for the SimpleStorage client: wallet session,
//! chain gating, the stored-value read and the `setValue` write lifecycle.

pub mod config;
pub mod connector;
pub mod controller;
pub mod error;
pub mod network_guard;
pub mod reader;
pub mod writer;

pub use config::{load_settings, Settings, SettingsError, SettingsOverrides};
pub use connector::ChainConnector;
pub use controller::{
    BackgroundTasks, ConnectionState, ControllerEvent, ControllerSnapshot, InteractionController,
    WriteState,
};
pub use error::ClientError;
pub use network_guard::NetworkStatus;
pub use reader::ContractReader;
pub use writer::{parse_value, ContractWriter, WriteOutcome};

#[cfg(test)]
#[path = "tests/fake_provider.rs"]
pub(crate) mod fake_provider;
