//! # MonSphere UI
//!
//! Page view models and the chrome around them, independent of any
//! rendering toolkit.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   route   ┌──────────────┐   ViewContext   ┌──────────────┐
//! │  Navigator   │ ────────▶ │  page view   │ ──────────────▶ │  Contracts   │
//! └──────────────┘           └──────┬───────┘                 └──────────────┘
//!                                   │ alert / confirm / open_url
//!                                   ▼
//!                            ┌──────────────┐
//!                            │   Notifier   │
//!                            └──────────────┘
//! ```
//!
//! Views render themselves as text; a front end either prints that or reads
//! the state snapshots directly.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod notices;
pub mod pages;
pub mod polling;
pub mod router;
pub mod store;
pub mod theme;

pub use notices::{ChannelNotifier, Notice, Notifier};
pub use pages::{
    connect_wallet, ChatsView, ForumDetailView, ForumsView, FriendAction, FriendsView,
    HeaderView, HistoryView, HomeAction, HomeView, SettingsView, ViewContext,
};
pub use polling::PollHandle;
pub use router::{NavItem, Navigator, Route, NAV_ITEMS};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use theme::{ThemeController, ThemeMode};
