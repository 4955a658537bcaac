//! # MonSphere Shared
//!
//! Common types used by every MonSphere crate.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - an async runtime
//! - an HTTP client
//! - anything that talks to a wallet
//!
//! If you need chain access, put it in `monsphere_chain`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod format;

pub use config::{
    AddChainParams, ConfigError, ContractAddresses, MonsphereConfig, NativeCurrency, NetworkConfig,
    PollingConfig, WalletConfig,
};
pub use constants::{REQUIRED_CHAIN_ID, REQUIRED_CHAIN_ID_HEX, THEME_KEY};
pub use format::{format_timestamp, truncate_address};
