//! # Client Configuration
//!
//! Every section of the config file is optional. Anything left out falls
//! back to the Monad Testnet deployment in [`crate::constants`].
//!
//! ```toml
//! [network]
//! name = "local"
//! required_chain_id = "0x7A69"
//! enforce_chain = true
//!
//! [network.add_chain]
//! chain_id = "0x7A69"
//! chain_name = "Anvil"
//! rpc_urls = ["http://127.0.0.1:8545"]
//! block_explorer_urls = []
//! native_currency = { name = "ETH", symbol = "ETH", decimals = 18 }
//!
//! [contracts]
//! chats = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
//!
//! [polling]
//! chats_interval_ms = 2000
//! ```

use std::path::Path;
use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has the wrong shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsphereConfig {
    /// Chain the client requires.
    pub network: NetworkConfig,
    /// Addresses of the four contracts.
    pub contracts: ContractAddresses,
    /// Polling periods.
    pub polling: PollingConfig,
    /// Wallet behaviour.
    pub wallet: WalletConfig,
}

impl MonsphereConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `path` if given, otherwise returns the baked-in defaults.
    ///
    /// # Errors
    ///
    /// Same as [`MonsphereConfig::from_file`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Network the wallet must be on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Short label for logs.
    pub name: String,
    /// Hex chain id (e.g. `0x279F`).
    pub required_chain_id: String,
    /// When false, the wallet may stay on whatever chain it is on.
    pub enforce_chain: bool,
    /// Parameters for `wallet_addEthereumChain` when the wallet does not know the chain.
    pub add_chain: Option<AddChainParams>,
}

impl NetworkConfig {
    /// Returns the chain id to enforce, if any.
    #[must_use]
    pub fn required_chain(&self) -> Option<&str> {
        if self.enforce_chain && !self.required_chain_id.is_empty() {
            Some(&self.required_chain_id)
        } else {
            None
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: constants::NETWORK_NAME.to_string(),
            required_chain_id: constants::REQUIRED_CHAIN_ID_HEX.to_string(),
            enforce_chain: true,
            add_chain: Some(AddChainParams::default()),
        }
    }
}

/// Chain registration parameters.
///
/// Serializes to the camelCase shape wallets expect, reads snake_case from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct AddChainParams {
    /// Hex chain id.
    pub chain_id: String,
    /// Display name.
    pub chain_name: String,
    /// RPC endpoints.
    pub rpc_urls: Vec<String>,
    /// Native currency description.
    pub native_currency: NativeCurrency,
    /// Explorer URLs.
    pub block_explorer_urls: Vec<String>,
}

impl Default for AddChainParams {
    fn default() -> Self {
        Self {
            chain_id: constants::REQUIRED_CHAIN_ID_HEX.to_string(),
            chain_name: constants::CHAIN_NAME.to_string(),
            rpc_urls: vec![constants::RPC_URL.to_string()],
            native_currency: NativeCurrency::default(),
            block_explorer_urls: vec![constants::BLOCK_EXPLORER_URL.to_string()],
        }
    }
}

/// Native currency of a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Currency name.
    pub name: String,
    /// Ticker.
    pub symbol: String,
    /// Decimals.
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            name: constants::NATIVE_CURRENCY_NAME.to_string(),
            symbol: constants::NATIVE_CURRENCY_SYMBOL.to_string(),
            decimals: constants::NATIVE_CURRENCY_DECIMALS,
        }
    }
}

/// Addresses of the four fixed contracts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractAddresses {
    /// UserRegistry contract.
    pub user_registry: Address,
    /// FriendSystem contract.
    pub friend_system: Address,
    /// Chats contract.
    pub chats: Address,
    /// Forums contract.
    pub forums: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            user_registry: constants::USER_REGISTRY_ADDRESS,
            friend_system: constants::FRIEND_SYSTEM_ADDRESS,
            chats: constants::CHATS_ADDRESS,
            forums: constants::FORUMS_ADDRESS,
        }
    }
}

/// Polling periods in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Chats view: last message refresh.
    pub chats_interval_ms: u64,
    /// History view: full session list refresh.
    pub history_interval_ms: u64,
    /// Transaction receipt polling.
    pub receipt_interval_ms: u64,
}

impl PollingConfig {
    /// Chats refresh period.
    #[must_use]
    pub const fn chats_interval(&self) -> Duration {
        Duration::from_millis(self.chats_interval_ms)
    }

    /// History refresh period.
    #[must_use]
    pub const fn history_interval(&self) -> Duration {
        Duration::from_millis(self.history_interval_ms)
    }

    /// Receipt polling period.
    #[must_use]
    pub const fn receipt_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            chats_interval_ms: constants::CHATS_POLL_INTERVAL_MS,
            history_interval_ms: constants::HISTORY_POLL_INTERVAL_MS,
            receipt_interval_ms: constants::RECEIPT_POLL_INTERVAL_MS,
        }
    }
}

/// Wallet behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Page opened when no wallet is available.
    pub install_url: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            install_url: constants::WALLET_INSTALL_URL.to_string(),
        }
    }
}
