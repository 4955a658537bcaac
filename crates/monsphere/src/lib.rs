//! # MonSphere
//!
//! Application shell of the MonSphere social client: one wallet session,
//! one listener, one navigator and one theme shared by every page view.
//!
//! ```text
//!   monsphere (bin) ──▶ App ──▶ ViewContext ──▶ page views ──▶ Contracts
//!                        │
//!                        └──▶ WalletListener ──▶ SessionEvent::ReloadRequired
//! ```
//!
//! Without a browser wallet the views read through [`HttpProvider`], and
//! every write reports that it needs a wallet.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod commands;
pub mod error;
pub mod rpc;
pub mod terminal;

pub use app::{App, Page};
pub use commands::{execute, Command, ThemeAction};
pub use error::{AppError, AppResult};
pub use rpc::HttpProvider;
pub use terminal::TerminalNotifier;

pub use monsphere_chain as chain;
pub use monsphere_shared as shared;
pub use monsphere_ui as ui;
