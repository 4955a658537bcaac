//! # Network & Contract Constants
//!
//! Production configuration for the MonSphere deployment on Monad Testnet.
//!
//! **CRITICAL:** These values are the defaults baked into the client binary.
//! A TOML config file can override every one of them.

use alloy_primitives::{address, Address};

// =============================================================================
// NETWORK CONFIGURATION - MONAD TESTNET
// =============================================================================

/// Short network label used in logs.
pub const NETWORK_NAME: &str = "monad-testnet";

/// Monad Testnet chain ID.
pub const REQUIRED_CHAIN_ID: u64 = 10_143;

/// Monad Testnet chain ID as the wallet reports it.
pub const REQUIRED_CHAIN_ID_HEX: &str = "0x279F";

/// Human readable chain name used when registering the chain with a wallet.
pub const CHAIN_NAME: &str = "Monad Testnet";

/// Public RPC endpoint.
pub const RPC_URL: &str = "https://testnet-rpc.monad.xyz/";

/// Block explorer.
pub const BLOCK_EXPLORER_URL: &str = "https://testnet.monadexplorer.com/";

/// Native currency name.
pub const NATIVE_CURRENCY_NAME: &str = "MON";

/// Native currency ticker.
pub const NATIVE_CURRENCY_SYMBOL: &str = "MON";

/// Native currency decimals.
pub const NATIVE_CURRENCY_DECIMALS: u8 = 18;

// =============================================================================
// CONTRACT ADDRESSES
// =============================================================================

/// UserRegistry: usernames, messaging public keys, account deletion.
pub const USER_REGISTRY_ADDRESS: Address = address!("68be3c99080f2613cc5C2555104788Ec3bf6f714");

/// FriendSystem: friend requests and relations.
pub const FRIEND_SYSTEM_ADDRESS: Address = address!("00838888043AEe4EE1aC6C50e616eB904faC3AD0");

/// Chats: 1:1 sessions and groups.
pub const CHATS_ADDRESS: Address = address!("7030948Eb01d864Fa409884ff3441B13e16681d2");

/// Forums: forums, posts, votes, comments.
pub const FORUMS_ADDRESS: Address = address!("7D4827051c2c7f264A5C7feA2D04c53a1C328D8d");

// =============================================================================
// CLIENT BEHAVIOUR
// =============================================================================

/// Chats view refreshes the active session's last message this often.
pub const CHATS_POLL_INTERVAL_MS: u64 = 5_000;

/// History view re-reads the whole session list this often.
pub const HISTORY_POLL_INTERVAL_MS: u64 = 10_000;

/// Receipt polling period while waiting for a transaction to be mined.
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

/// Where users without a wallet are sent.
pub const WALLET_INSTALL_URL: &str = "https://metamask.io/";

/// Key of the single persisted preference entry.
pub const THEME_KEY: &str = "theme";
