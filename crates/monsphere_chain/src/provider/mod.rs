//! # Wallet Provider Protocol
//!
//! The minimal EIP-1193 surface the client relies on: JSON request/response
//! plus account and chain change notifications.
//!
//! ## Methods Used
//!
//! | Method                         | Purpose                             |
//! |--------------------------------|-------------------------------------|
//! | `eth_accounts`                 | Already-authorized accounts         |
//! | `eth_requestAccounts`          | Ask the user to connect             |
//! | `eth_chainId`                  | Current chain (hex string)          |
//! | `wallet_switchEthereumChain`   | Move the wallet to the chain        |
//! | `wallet_addEthereumChain`      | Teach the wallet a new chain        |
//! | `eth_call` / `eth_getCode`     | Contract reads                      |
//! | `eth_sendTransaction`          | Contract writes                     |
//! | `eth_getTransactionReceipt`    | Wait for a write to be mined        |

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::ProviderError;

/// Method names.
pub mod methods {
    /// Already-authorized accounts.
    pub const ACCOUNTS: &str = "eth_accounts";
    /// Connection prompt.
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    /// Current chain id.
    pub const CHAIN_ID: &str = "eth_chainId";
    /// Chain switch.
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    /// Chain registration.
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
    /// Read-only contract call.
    pub const CALL: &str = "eth_call";
    /// Deployed bytecode lookup.
    pub const GET_CODE: &str = "eth_getCode";
    /// Signed contract write.
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    /// Receipt lookup.
    pub const GET_RECEIPT: &str = "eth_getTransactionReceipt";
}

/// A notification pushed by the wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletNotification {
    /// The set of exposed accounts changed. Empty means the user disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet moved to another chain (hex id).
    ChainChanged(String),
}

/// An injected wallet (or anything that speaks its protocol).
///
/// Implementations must be cheap to share; the session keeps one behind an
/// `Arc` for the lifetime of the process.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Sends one request and returns the raw JSON result.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribes to account and chain notifications.
    ///
    /// Dropping the receiver removes the listener.
    fn subscribe(&self) -> broadcast::Receiver<WalletNotification>;
}

/// Sends a request and deserializes its result.
///
/// The outer error is the provider's own failure; the inner one is a
/// result that does not have the expected shape.
///
/// # Errors
///
/// Returns the provider's error unchanged.
pub async fn request_as<T: DeserializeOwned>(
    provider: &dyn Eip1193Provider,
    method: &str,
    params: Value,
) -> Result<Result<T, String>, ProviderError> {
    tracing::debug!(method, "wallet request");
    let value = provider.request(method, params).await?;
    Ok(serde_json::from_value(value).map_err(|err| err.to_string()))
}

/// Compares two hex chain ids the way wallets report them (case-insensitive).
#[must_use]
pub fn same_chain(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_ids_compare_case_insensitively() {
        assert!(same_chain("0x279F", "0x279f"));
        assert!(!same_chain("0x279F", "0x1"));
    }
}
