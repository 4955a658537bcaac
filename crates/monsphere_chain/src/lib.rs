//! # MonSphere Chain Bridge
//!
//! Everything between the page views and the chain.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  notifications  ┌─────────────────┐
//! │  Wallet         │ ──────────────▶ │  WalletListener │
//! │  (EIP-1193)     │                 └────────┬────────┘
//! └────────┬────────┘                          │
//!          │ request/response                  ▼
//!          │                          ┌─────────────────┐
//!          │◀──────── connect ─────── │  WalletSession  │
//!          │                          └────────┬────────┘
//!          │                                   │ runner()
//!          │                                   ▼
//!          │◀── eth_call / sendTx ─── ┌─────────────────┐
//!                                     │  Contracts      │
//!                                     └─────────────────┘
//! ```
//!
//! The contracts own all durable state. This crate holds nothing but the
//! current connection.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bindings;
pub mod contracts;
pub mod error;
pub mod events;
pub mod listener;
pub mod provider;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bindings::{
    Chats, ContractRunner, Contracts, Forums, FriendSystem, PendingTransaction, UserRegistry,
};
pub use contracts::{ForumInfo, PostInfo, Profile, Relation, SessionRow, Vote};
pub use error::{ContractError, ProviderError, WalletError};
pub use events::{EventParser, ForumCreated, ReceiptLog, TransactionReceipt};
pub use listener::{ListenerStats, WalletListener};
pub use provider::{Eip1193Provider, WalletNotification};
pub use session::{Connection, SessionEvent, SessionSubscription, Signer, WalletSession};

pub use alloy_primitives::{Address, B256, I256, U256};
