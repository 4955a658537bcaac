//! Home: landing copy, wallet connection and account registration.

use std::fmt::Write as _;
use std::sync::Arc;

use monsphere_chain::Address;
use parking_lot::Mutex;

use super::{connect_wallet, short, submit, ViewContext};

/// The primary call to action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HomeAction {
    /// No wallet connected.
    ConnectWallet,
    /// Connected: head to the chats.
    GoToChats,
}

/// Home view state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HomeState {
    /// Registration lookup in progress.
    pub checking: bool,
    /// `None` until known, and when the registry is not deployed on this chain.
    pub registered: Option<bool>,
    /// Username field (prefilled from the profile when registered).
    pub username: String,
    /// Public key field (prefilled from the profile when registered).
    pub pub_key: String,
    /// Registration transaction in flight.
    pub submitting: bool,
}

/// Home view.
pub struct HomeView {
    ctx: ViewContext,
    state: Arc<Mutex<HomeState>>,
}

impl HomeView {
    /// Creates the view. Call [`HomeView::load`] to check registration.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            state: Arc::new(Mutex::new(HomeState::default())),
        }
    }

    /// Snapshot of the state.
    #[must_use]
    pub fn state(&self) -> HomeState {
        self.state.lock().clone()
    }

    /// Primary action for the current session.
    #[must_use]
    pub fn primary_action(&self) -> HomeAction {
        if self.ctx.session.is_connected() {
            HomeAction::GoToChats
        } else {
            HomeAction::ConnectWallet
        }
    }

    /// Runs the primary action.
    pub async fn run_primary_action(&self) {
        match self.primary_action() {
            HomeAction::ConnectWallet => {
                if connect_wallet(&self.ctx).await.is_some() {
                    self.load().await;
                }
            }
            HomeAction::GoToChats => {
                self.ctx.navigator.navigate("/chats");
            }
        }
    }

    /// Checks the connected account's registration.
    pub async fn load(&self) {
        if let Some(address) = self.ctx.address() {
            self.load_for(address).await;
        }
    }

    /// Checks `address`'s registration.
    ///
    /// If the registry has no code on this chain, registration stays unknown.
    pub async fn load_for(&self, address: Address) {
        let Some(contracts) = self.ctx.contracts() else {
            return;
        };
        self.state.lock().checking = true;

        let registry = &contracts.user_registry;
        let result = async {
            if !registry.is_deployed().await? {
                tracing::warn!(registry = %registry.address(), "user registry not deployed on this network");
                return Ok(None);
            }
            let registered = registry.is_registered(address).await?;
            let profile = if registered {
                Some(registry.get_profile(address).await?)
            } else {
                None
            };
            Ok::<_, monsphere_chain::ContractError>(Some((registered, profile)))
        }
        .await;

        let mut state = self.state.lock();
        state.checking = false;
        match result {
            Ok(None) => state.registered = None,
            Ok(Some((registered, profile))) => {
                state.registered = Some(registered);
                if let Some(profile) = profile {
                    state.username = profile.username;
                    state.pub_key = profile.pub_key;
                }
            }
            Err(err) => tracing::error!(%err, "registration check failed"),
        }
    }

    /// Sets the username field.
    pub fn set_username(&self, username: &str) {
        self.state.lock().username = username.to_string();
    }

    /// Sets the public key field.
    pub fn set_pub_key(&self, pub_key: &str) {
        self.state.lock().pub_key = pub_key.to_string();
    }

    /// Register is enabled with a username and nothing in flight.
    #[must_use]
    pub fn can_register(&self) -> bool {
        let state = self.state.lock();
        !state.submitting && !state.username.trim().is_empty()
    }

    /// Registers the connected account.
    pub async fn register(&self) {
        let (username, pub_key) = {
            let mut state = self.state.lock();
            if state.submitting || state.username.trim().is_empty() {
                return;
            }
            state.submitting = true;
            (state.username.trim().to_string(), state.pub_key.trim().to_string())
        };

        let receipt = submit(&self.ctx, "Registration failed", |contracts| async move {
            contracts.user_registry.register(&username, &pub_key).await
        })
        .await;

        let mut state = self.state.lock();
        state.submitting = false;
        if receipt.is_some() {
            tracing::info!(username = %state.username.trim(), "registered");
            state.registered = Some(true);
        }
    }

    /// Text rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let state = self.state();
        let mut out = String::from("MonSphere: Web3 Social Chat\n");
        out.push_str("Decentralized 1:1 and group chats, forums, and friends, powered by smart contracts.\n\n");

        match self.primary_action() {
            HomeAction::ConnectWallet => out.push_str("[Connect Wallet]\n\n"),
            HomeAction::GoToChats => out.push_str("[Go to Chats]\n\n"),
        }

        out.push_str("Account\n");
        let Some(address) = self.ctx.address() else {
            out.push_str("Connect your wallet to continue.\n");
            return out;
        };
        let _ = writeln!(out, "Address: {}", short(address));
        out.push_str(&describe_registration(&state));
        out
    }

    /// Account block for any address, as loaded by [`HomeView::load_for`].
    #[must_use]
    pub fn render_for(&self, address: Address) -> String {
        let state = self.state();
        let mut out = format!("Account {address}\n");
        out.push_str(&describe_registration(&state));
        if state.registered == Some(true) && !state.pub_key.is_empty() {
            let _ = writeln!(out, "Public key: {}", state.pub_key);
        }
        out
    }
}

/// Registration block of the Home rendering.
fn describe_registration(state: &HomeState) -> String {
    if state.checking {
        return "Checking registration…\n".to_string();
    }
    match state.registered {
        Some(true) => format!(
            "You are registered as {}. Explore Chats, Forums, Friends.\n",
            state.username
        ),
        Some(false) => "Not registered. Pick a username to register.\n".to_string(),
        None => "Registration status unknown (registry not available on this network).\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::fixtures::{self, addresses, me};
    use crate::router::Route;
    use alloy_sol_types::SolCall;
    use monsphere_chain::contracts::IUserRegistry;
    use monsphere_chain::testing::ScriptedWallet;

    fn script_registry(wallet: &ScriptedWallet, registered: bool) {
        wallet.on_call(addresses().user_registry, move |_: IUserRegistry::isRegisteredCall| {
            IUserRegistry::isRegisteredCall::abi_encode_returns(&(registered,))
        });
        wallet.on_call(addresses().user_registry, |_: IUserRegistry::getProfileCall| {
            IUserRegistry::getProfileCall::abi_encode_returns(&("alice".to_string(), "pk".to_string()))
        });
    }

    #[tokio::test]
    async fn test_disconnected_home() {
        let harness = fixtures::idle();
        let view = HomeView::new(harness.ctx.clone());

        assert_eq!(view.primary_action(), HomeAction::ConnectWallet);
        assert!(view.render().contains("Connect your wallet to continue."));
    }

    #[tokio::test]
    async fn test_connect_then_go_to_chats() {
        let harness = fixtures::idle();
        let view = HomeView::new(harness.ctx.clone());

        view.run_primary_action().await;
        assert_eq!(view.primary_action(), HomeAction::GoToChats);

        view.run_primary_action().await;
        assert_eq!(harness.ctx.navigator.current(), Route::Chats);
    }

    #[tokio::test]
    async fn test_registered_profile_prefills() {
        let harness = fixtures::connected().await;
        script_registry(&harness.wallet, true);
        let view = HomeView::new(harness.ctx.clone());

        view.load().await;

        let state = view.state();
        assert_eq!(state.registered, Some(true));
        assert_eq!(state.username, "alice");
        assert!(view.render().contains("Explore Chats, Forums, Friends."));
    }

    #[tokio::test]
    async fn test_missing_registry_leaves_status_unknown() {
        let harness =
            fixtures::connected_with(ScriptedWallet::new().with_accounts(vec![me()])).await;
        let view = HomeView::new(harness.ctx.clone());

        view.load().await;

        assert_eq!(view.state().registered, None);
        assert_eq!(harness.wallet.count("eth_call"), 0);
    }

    #[tokio::test]
    async fn test_register_requires_username_and_sends_once() {
        let harness = fixtures::connected().await;
        script_registry(&harness.wallet, false);
        let view = HomeView::new(harness.ctx.clone());
        view.load().await;
        assert_eq!(view.state().registered, Some(false));

        view.set_username("   ");
        assert!(!view.can_register());
        view.register().await;
        assert_eq!(harness.wallet.transaction_count(), 0);

        view.set_username("  alice ");
        view.set_pub_key("pk");
        view.register().await;

        let sent = harness.wallet.sent::<IUserRegistry::registerCall>(addresses().user_registry);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].username, "alice");
        assert_eq!(view.state().registered, Some(true));
        assert!(!view.state().submitting);
    }

    #[tokio::test]
    async fn test_failed_registration_alerts() {
        let harness = fixtures::connected().await;
        harness.wallet.on_send(addresses().user_registry, |_: IUserRegistry::registerCall| {
            monsphere_chain::testing::TxOutcome::Reverted
        });
        let view = HomeView::new(harness.ctx.clone());
        view.set_username("alice");

        view.register().await;

        let alerts = harness.notifier.drain_alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Registration failed: "));
        assert_ne!(view.state().registered, Some(true));
    }
}
