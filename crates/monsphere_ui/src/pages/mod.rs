//! # Page Views
//!
//! One view model per route. Every view follows the same shape:
//!
//! ```text
//!   mount ──▶ read(s) ──▶ state ──▶ render()
//!                ▲                    │
//!                │      user action   ▼
//!                └── re-read ◀── wait ◀── submit
//! ```
//!
//! - Reads that fail are logged and leave the previous state untouched.
//! - Writes that fail become an alert; the view stays where it is.
//! - There is no optimistic update: the state changes once the receipt is in.
//!
//! View state sits behind a `parking_lot::Mutex` that is never held across
//! an `.await`.

pub mod chats;
pub mod forum_detail;
pub mod forums;
pub mod friends;
pub mod header;
pub mod history;
pub mod home;
pub mod settings;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use monsphere_chain::{
    Address, ContractError, Contracts, PendingTransaction, TransactionReceipt, WalletError,
    WalletSession, U256,
};
use monsphere_shared::{ContractAddresses, PollingConfig};

use crate::notices::Notifier;
use crate::router::Navigator;

pub use chats::ChatsView;
pub use forum_detail::ForumDetailView;
pub use forums::ForumsView;
pub use friends::{FriendAction, FriendsView};
pub use header::HeaderView;
pub use history::HistoryView;
pub use home::{HomeAction, HomeView};
pub use settings::SettingsView;

/// Everything a view needs from the application.
///
/// Cheap to clone: every field is shared.
#[derive(Clone)]
pub struct ViewContext {
    /// The process-wide wallet session.
    pub session: Arc<WalletSession>,
    /// Where notices go.
    pub notifier: Arc<dyn Notifier>,
    /// Current location.
    pub navigator: Arc<Navigator>,
    /// Contract addresses for the bindings.
    pub addresses: ContractAddresses,
    /// Poll periods.
    pub polling: PollingConfig,
}

impl ViewContext {
    /// Contract handles for the session's current runner.
    ///
    /// Recomputed on every call, so a disconnect takes effect immediately.
    /// `None` when there is neither a signer nor a read-only provider.
    #[must_use]
    pub fn contracts(&self) -> Option<Contracts> {
        self.session
            .runner()
            .map(|runner| Contracts::new(&runner, &self.addresses, self.receipt_interval()))
    }

    /// The connected address.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        self.session.address()
    }

    /// Receipt polling period for writes.
    #[must_use]
    pub const fn receipt_interval(&self) -> Duration {
        self.polling.receipt_interval()
    }

    /// Shows a failed write as `"<fallback>: <error>"`.
    pub fn report(&self, fallback: &str, err: &ContractError) {
        tracing::error!(%err, "{fallback}");
        self.notifier.alert(&format!("{fallback}: {err}"));
    }
}

/// Connects the wallet, turning every failure into a notice.
///
/// A missing wallet also opens the install page.
pub async fn connect_wallet(ctx: &ViewContext) -> Option<Address> {
    match ctx.session.connect().await {
        Ok(connection) => Some(connection.address()),
        Err(err) => {
            tracing::error!(%err, "wallet connection failed");
            ctx.notifier.alert(&err.user_message());
            if let WalletError::NotInstalled { install_url } = &err {
                ctx.notifier.open_url(install_url);
            }
            None
        }
    }
}

/// Sends a write and waits for it to be mined.
///
/// Every failure, including having no runner at all, is reported as
/// `"<fallback>: <error>"` and yields `None`.
pub(crate) async fn submit<F, Fut>(ctx: &ViewContext, fallback: &str, write: F) -> Option<TransactionReceipt>
where
    F: FnOnce(Contracts) -> Fut,
    Fut: Future<Output = Result<PendingTransaction, ContractError>>,
{
    let Some(contracts) = ctx.contracts() else {
        ctx.report(fallback, &ContractError::ReadOnly);
        return None;
    };
    let result = match write(contracts).await {
        Ok(pending) => pending.wait().await,
        Err(err) => Err(err),
    };
    match result {
        Ok(receipt) => Some(receipt),
        Err(err) => {
            ctx.report(fallback, &err);
            None
        }
    }
}

/// Parses user input as an address.
pub(crate) fn parse_address(input: &str) -> Option<Address> {
    input.trim().parse().ok()
}

/// Parses a decimal id as typed by the user.
pub(crate) fn parse_id(input: &str) -> Option<U256> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(input, 10).ok()
}

/// Renders a chain timestamp.
pub(crate) fn format_ts(ts: U256) -> String {
    monsphere_shared::format_timestamp(monsphere_chain::contracts::timestamp_u64(ts))
}

/// Short form of an address.
pub(crate) fn short(address: Address) -> String {
    monsphere_shared::truncate_address(&address.to_string(), 4)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Views wired to a scripted wallet.

    use std::sync::Arc;

    use monsphere_chain::testing::ScriptedWallet;
    use monsphere_chain::{Address, Eip1193Provider, WalletSession};
    use monsphere_shared::{ContractAddresses, NetworkConfig, PollingConfig, WalletConfig};

    use super::ViewContext;
    use crate::notices::ChannelNotifier;
    use crate::router::Navigator;

    pub fn me() -> Address {
        Address::repeat_byte(0xA1)
    }

    pub fn bob() -> Address {
        Address::repeat_byte(0xB0)
    }

    pub fn addresses() -> ContractAddresses {
        ContractAddresses {
            user_registry: Address::repeat_byte(0x01),
            friend_system: Address::repeat_byte(0x02),
            chats: Address::repeat_byte(0x03),
            forums: Address::repeat_byte(0x04),
        }
    }

    pub struct Harness {
        pub wallet: Arc<ScriptedWallet>,
        pub notifier: Arc<ChannelNotifier>,
        pub ctx: ViewContext,
    }

    /// A wallet offering [`me`], with the registry deployed.
    pub fn wallet() -> ScriptedWallet {
        ScriptedWallet::new()
            .with_accounts(vec![me()])
            .with_code(addresses().user_registry)
    }

    /// A context whose session has no connection yet.
    pub fn idle() -> Harness {
        idle_with(wallet())
    }

    /// Like [`idle`], over a custom wallet.
    pub fn idle_with(wallet: ScriptedWallet) -> Harness {
        build(wallet, false)
    }

    fn build(wallet: ScriptedWallet, read_only: bool) -> Harness {
        let wallet = Arc::new(wallet);
        let notifier = Arc::new(ChannelNotifier::new(true));
        let mut session = WalletSession::new(
            Some(wallet.clone() as Arc<dyn Eip1193Provider>),
            NetworkConfig::default(),
            &WalletConfig::default(),
        );
        if read_only {
            session = session.with_read_only(wallet.clone() as Arc<dyn Eip1193Provider>);
        }
        let ctx = ViewContext {
            session: Arc::new(session),
            notifier: notifier.clone(),
            navigator: Arc::new(Navigator::default()),
            addresses: addresses(),
            polling: PollingConfig::default(),
        };
        Harness { wallet, notifier, ctx }
    }

    /// A context connected as [`me`], with an empty request log.
    pub async fn connected() -> Harness {
        connected_with(wallet()).await
    }

    /// Connected as [`me`], with the same wallet also attached as the
    /// read-only provider, so bindings survive a disconnect.
    pub async fn connected_with_read_only() -> Harness {
        let harness = build(wallet(), true);
        harness.ctx.session.connect().await.unwrap();
        harness.wallet.clear_requests();
        harness
    }

    /// Like [`connected`], over a custom wallet.
    pub async fn connected_with(wallet: ScriptedWallet) -> Harness {
        let harness = idle_with(wallet);
        harness.ctx.session.connect().await.unwrap();
        harness.wallet.clear_requests();
        harness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(" 42 "), Some(U256::from(42)));
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("0x2a"), None);
        assert_eq!(parse_id("-1"), None);
    }

    #[test]
    fn test_parse_address() {
        let mut one = [0u8; 20];
        one[19] = 1;
        assert_eq!(
            parse_address(" 0x0000000000000000000000000000000000000001 "),
            Some(Address::from(one))
        );
        assert_eq!(parse_address("bob"), None);
    }
}
