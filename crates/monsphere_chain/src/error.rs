//! # Chain Error Types
//!
//! All errors that can occur between the client and the wallet or contracts.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error returned by the wallet provider.
///
/// Mirrors the `{ code, message }` shape of EIP-1193 provider errors.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    /// Numeric error code.
    pub code: i64,
    /// Human readable message.
    pub message: String,
}

impl ProviderError {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account or method has not been authorized.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider does not support the method.
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// The provider is disconnected from all chains.
    pub const DISCONNECTED: i64 = 4900;
    /// The provider is not connected to the requested chain.
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    /// The wallet does not know the requested chain.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// JSON-RPC invalid params.
    pub const INVALID_PARAMS: i64 = -32602;
    /// JSON-RPC internal error, also used for malformed responses.
    pub const INTERNAL: i64 = -32603;

    /// Creates a new provider error.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A user rejection.
    #[must_use]
    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected the request.")
    }

    /// A response that could not be interpreted.
    #[must_use]
    pub fn invalid_response(method: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(Self::INTERNAL, format!("invalid {method} response: {detail}"))
    }

    /// Returns true if the user rejected the request.
    #[must_use]
    pub const fn is_user_rejected(&self) -> bool {
        self.code == Self::USER_REJECTED
    }

    /// Returns true if the wallet does not know the requested chain.
    #[must_use]
    pub const fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }
}

/// Errors from the wallet session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// No wallet is injected.
    #[error("wallet not installed (get one at {install_url})")]
    NotInstalled {
        /// Where the user can install one.
        install_url: String,
    },

    /// The user rejected the connection request.
    #[error("connection request rejected")]
    Rejected,

    /// The wallet refused to switch to the required chain.
    #[error("wallet is on the wrong network")]
    WrongNetwork,

    /// The wallet does not know the required chain and no registration parameters are configured.
    #[error("required network is unknown to the wallet and no chain parameters are configured")]
    MissingChainParams,

    /// The wallet returned no accounts.
    #[error("wallet returned no accounts")]
    NoAccounts,

    /// Any other provider failure.
    #[error(transparent)]
    Provider(ProviderError),

    /// The wallet answered with something that is not the expected shape.
    #[error("unexpected wallet response: {0}")]
    Decode(String),
}

impl WalletError {
    /// Maps a provider error, folding user rejections into [`WalletError::Rejected`].
    #[must_use]
    pub fn from_provider(err: ProviderError) -> Self {
        if err.is_user_rejected() {
            Self::Rejected
        } else {
            Self::Provider(err)
        }
    }

    /// The alert text shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotInstalled { .. } => {
                "Wallet not installed! Please install a wallet to continue.".to_string()
            }
            Self::Rejected => "Please connect your wallet to continue.".to_string(),
            Self::WrongNetwork => "Please switch to the required network in your wallet.".to_string(),
            Self::MissingChainParams => "Required network not found in wallet. Please add it or provide add_chain parameters in the config.".to_string(),
            Self::NoAccounts | Self::Provider(_) | Self::Decode(_) => {
                "Failed to connect wallet. Please try again.".to_string()
            }
        }
    }
}

/// Errors from contract calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// A write was attempted with a read-only provider.
    #[error("no signer available, connect a wallet first")]
    ReadOnly,

    /// The provider rejected or failed the request.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// ABI encoding or decoding failed.
    #[error("abi error: {0}")]
    Abi(String),

    /// The node answered with something that is not the expected shape.
    #[error("invalid {method} response: {detail}")]
    InvalidResponse {
        /// Method that was called.
        method: String,
        /// What was wrong with it.
        detail: String,
    },

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted")]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: B256,
    },
}

impl From<alloy_sol_types::Error> for ContractError {
    fn from(err: alloy_sol_types::Error) -> Self {
        Self::Abi(err.to_string())
    }
}

/// Result type for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_folds() {
        assert_eq!(
            WalletError::from_provider(ProviderError::user_rejected()),
            WalletError::Rejected
        );
        let other = ProviderError::new(-32000, "boom");
        assert_eq!(
            WalletError::from_provider(other.clone()),
            WalletError::Provider(other)
        );
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            WalletError::Rejected.user_message(),
            "Please connect your wallet to continue."
        );
        assert_eq!(
            WalletError::NoAccounts.user_message(),
            "Failed to connect wallet. Please try again."
        );
    }
}
