//! Application errors.

use monsphere_chain::{ContractError, WalletError};
use monsphere_shared::ConfigError;
use monsphere_ui::StoreError;
use thiserror::Error;

/// Anything that can stop a command.
#[derive(Error, Debug)]
pub enum AppError {
    /// The configuration file is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The preference file could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Connecting the wallet failed.
    #[error("wallet: {0}")]
    Wallet(#[from] WalletError),

    /// A contract read failed.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// A command argument could not be used.
    #[error("invalid {what}: {value}")]
    InvalidInput {
        /// What the argument should have been.
        what: &'static str,
        /// What was given.
        value: String,
    },

    /// Neither a wallet nor an RPC endpoint is available.
    #[error("no provider configured; pass --rpc-url or set network.add_chain.rpc_urls")]
    NoProvider,
}

impl AppError {
    /// Shorthand for [`AppError::InvalidInput`].
    #[must_use]
    pub fn invalid(what: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidInput {
            what,
            value: value.into(),
        }
    }
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
