//! # Application Shell
//!
//! Owns the process-wide pieces and hands views their context.
//!
//! ```text
//!   start ──▶ theme.init ──▶ auto_connect ──▶ spawn listener
//!                                                 │
//!        ReloadRequired (chain changed) ◀─────────┘
//!                 │
//!                 ▼
//!   reload ──▶ stop listener ──▶ back to Home ──▶ start again
//! ```

use std::sync::Arc;

use monsphere_chain::{
    Address, Eip1193Provider, SessionEvent, SessionSubscription, WalletListener, WalletSession,
};
use monsphere_shared::MonsphereConfig;
use monsphere_ui::{
    ChatsView, ForumDetailView, ForumsView, FriendsView, HeaderView, HistoryView, HomeView,
    KeyValueStore, Navigator, Notifier, Route, SettingsView, ThemeController, ThemeMode,
    ViewContext,
};
use parking_lot::Mutex;

/// The view for one route.
pub enum Page {
    /// `/`
    Home(HomeView),
    /// `/chats`
    Chats(ChatsView),
    /// `/forums`
    Forums(ForumsView),
    /// `/forums/:id`
    ForumDetail(ForumDetailView),
    /// `/friends`
    Friends(FriendsView),
    /// `/history`
    History(HistoryView),
    /// `/settings`
    Settings(SettingsView),
}

impl Page {
    /// Runs the page's mount reads (and starts its poll, if it has one).
    pub async fn mount(&self) {
        match self {
            Self::Home(view) => view.load().await,
            Self::Chats(view) => view.mount().await,
            Self::ForumDetail(view) => view.load().await,
            Self::History(view) => view.mount().await,
            Self::Forums(_) | Self::Friends(_) | Self::Settings(_) => {}
        }
    }

    /// Text rendering of the page body.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Home(view) => view.render(),
            Self::Chats(view) => view.render(),
            Self::Forums(view) => view.render(),
            Self::ForumDetail(view) => view.render(),
            Self::Friends(view) => view.render(),
            Self::History(view) => view.render(),
            Self::Settings(view) => view.render(),
        }
    }
}

/// The running client.
pub struct App {
    config: MonsphereConfig,
    session: Arc<WalletSession>,
    listener: Mutex<Option<WalletListener>>,
    navigator: Arc<Navigator>,
    notifier: Arc<dyn Notifier>,
    theme: Arc<ThemeController>,
}

impl App {
    /// Builds the client.
    ///
    /// # Arguments
    ///
    /// * `wallet` - Injected wallet, if any. Required for writes.
    /// * `read_only` - Provider used for reads while no wallet is connected.
    /// * `notifier` - Where alerts and confirmations go.
    /// * `store` - Preference storage (theme).
    #[must_use]
    pub fn new(
        config: MonsphereConfig,
        wallet: Option<Arc<dyn Eip1193Provider>>,
        read_only: Option<Arc<dyn Eip1193Provider>>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let mut session = WalletSession::new(wallet, config.network.clone(), &config.wallet);
        if let Some(provider) = read_only {
            session = session.with_read_only(provider);
        }
        Self {
            config,
            session: Arc::new(session),
            listener: Mutex::new(None),
            navigator: Arc::new(Navigator::default()),
            notifier,
            theme: Arc::new(ThemeController::new(store)),
        }
    }

    /// Loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &MonsphereConfig {
        &self.config
    }

    /// The wallet session.
    #[must_use]
    pub fn session(&self) -> &Arc<WalletSession> {
        &self.session
    }

    /// The navigator.
    #[must_use]
    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    /// The theme controller.
    #[must_use]
    pub fn theme(&self) -> &Arc<ThemeController> {
        &self.theme
    }

    /// Context handed to every view.
    #[must_use]
    pub fn context(&self) -> ViewContext {
        ViewContext {
            session: Arc::clone(&self.session),
            notifier: Arc::clone(&self.notifier),
            navigator: Arc::clone(&self.navigator),
            addresses: self.config.contracts,
            polling: self.config.polling,
        }
    }

    /// Session events, including the reload request after a chain change.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        self.session.subscribe()
    }

    /// Applies the theme, reconnects silently and starts listening to the
    /// wallet.
    ///
    /// A failed silent reconnect is logged; the app starts disconnected.
    pub async fn start(&self, system_prefers_dark: bool) -> Option<Address> {
        let mode = self.theme.init(system_prefers_dark);
        tracing::debug!(%mode, "theme initialised");

        let address = match self.session.auto_connect().await {
            Ok(connection) => connection.map(|connection| connection.address()),
            Err(err) => {
                tracing::warn!(%err, "auto-connect failed");
                None
            }
        };

        let listener = WalletListener::spawn(Arc::clone(&self.session));
        if listener.is_none() {
            tracing::debug!("no wallet, not listening for notifications");
        }
        *self.listener.lock() = listener;

        tracing::info!(
            network = %self.config.network.name,
            connected = address.is_some(),
            "monsphere started"
        );
        address
    }

    /// Returns true while the wallet listener runs.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(WalletListener::is_running)
    }

    /// Rebuilds after a chain change: new listener, back on Home, session
    /// re-established if the wallet allows it.
    pub async fn reload(&self) -> Option<Address> {
        tracing::info!("reloading");
        if let Some(listener) = self.listener.lock().take() {
            listener.stop();
        }
        self.session.disconnect();
        self.navigator.navigate(Route::Home.path().as_str());
        self.start(self.theme.mode() == ThemeMode::Dark).await
    }

    /// Reacts to one session event. Returns true if the app reloaded.
    ///
    /// A failed reconnect after an account change is alerted with the
    /// wallet error's user message.
    pub async fn handle_event(&self, event: &SessionEvent) -> bool {
        match event {
            SessionEvent::ReloadRequired { chain_id } => {
                tracing::warn!(%chain_id, "chain changed");
                self.reload().await;
                true
            }
            SessionEvent::ConnectFailed(err) => {
                tracing::warn!(%err, "reconnect after account change failed");
                self.notifier.alert(&err.user_message());
                false
            }
            SessionEvent::Connected(_) | SessionEvent::Disconnected => false,
        }
    }

    /// Header view.
    #[must_use]
    pub fn header(&self) -> HeaderView {
        HeaderView::new(self.context())
    }

    /// Builds the view for `route`.
    #[must_use]
    pub fn view_for(&self, route: &Route) -> Page {
        let ctx = self.context();
        match route {
            Route::Home => Page::Home(HomeView::new(ctx)),
            Route::Chats => Page::Chats(ChatsView::new(ctx)),
            Route::Forums => Page::Forums(ForumsView::new(ctx)),
            Route::ForumDetail(id) => Page::ForumDetail(ForumDetailView::new(ctx, id)),
            Route::Friends => Page::Friends(FriendsView::new(ctx)),
            Route::History => Page::History(HistoryView::new(ctx)),
            Route::Settings => Page::Settings(SettingsView::new(ctx, Arc::clone(&self.theme))),
        }
    }

    /// Navigates and returns the view for the new location.
    pub fn open(&self, path: &str) -> Page {
        let route = self.navigator.navigate(path);
        self.view_for(&route)
    }

    /// View for the current location.
    #[must_use]
    pub fn current_page(&self) -> Page {
        self.view_for(&self.navigator.current())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.lock().take() {
            listener.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monsphere_chain::provider::methods;
    use monsphere_chain::testing::ScriptedWallet;
    use monsphere_chain::ProviderError;
    use monsphere_ui::{ChannelNotifier, MemoryStore};

    fn me() -> Address {
        Address::repeat_byte(0xA1)
    }

    fn app_with(wallet: &Arc<ScriptedWallet>) -> App {
        App::new(
            MonsphereConfig::default(),
            Some(wallet.clone() as Arc<dyn Eip1193Provider>),
            None,
            Arc::new(ChannelNotifier::new(true)),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_start_reconnects_authorized_wallet() {
        let wallet = Arc::new(ScriptedWallet::new().with_authorized(vec![me()]));
        let app = app_with(&wallet);

        assert_eq!(app.start(true).await, Some(me()));
        assert!(app.is_listening());
        assert_eq!(app.theme().mode(), ThemeMode::Dark);
        assert!(app.header().account_label().is_some());
    }

    #[tokio::test]
    async fn test_start_without_authorization_stays_disconnected() {
        let wallet = Arc::new(ScriptedWallet::new().with_accounts(vec![me()]));
        let app = app_with(&wallet);

        assert_eq!(app.start(false).await, None);
        assert!(!app.session().is_connected());
    }

    #[tokio::test]
    async fn test_view_for_every_route() {
        let wallet = Arc::new(ScriptedWallet::new());
        let app = app_with(&wallet);

        assert!(matches!(app.open("/chats"), Page::Chats(_)));
        assert!(matches!(app.open("/forums/3"), Page::ForumDetail(_)));
        assert!(matches!(app.open("/nowhere"), Page::Home(_)));
        assert!(matches!(app.open("/settings"), Page::Settings(_)));
        assert!(matches!(app.current_page(), Page::Settings(_)));
    }

    #[tokio::test]
    async fn test_failed_account_switch_alerts() {
        let wallet = Arc::new(ScriptedWallet::new().with_authorized(vec![me()]));
        let notifier = Arc::new(ChannelNotifier::new(true));
        let app = App::new(
            MonsphereConfig::default(),
            Some(wallet.clone() as Arc<dyn Eip1193Provider>),
            None,
            notifier.clone(),
            Arc::new(MemoryStore::new()),
        );
        app.start(false).await;
        let mut events = app.subscribe();

        wallet.fail_next(methods::REQUEST_ACCOUNTS, ProviderError::user_rejected());
        wallet.emit_accounts_changed(vec![Address::repeat_byte(0xB0)]);
        let event = events.recv().await.unwrap();

        assert!(matches!(event, SessionEvent::ConnectFailed(_)));
        assert!(!app.handle_event(&event).await);
        assert_eq!(
            notifier.drain_alerts(),
            vec!["Please connect your wallet to continue.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_chain_change_reloads_to_home() {
        let wallet = Arc::new(ScriptedWallet::new().with_authorized(vec![me()]));
        let app = app_with(&wallet);
        app.start(false).await;
        let mut events = app.subscribe();
        let _ = app.open("/friends");

        wallet.emit_chain_changed("0x1");
        let event = events.recv().await.unwrap();
        assert!(app.handle_event(&event).await);

        assert_eq!(app.navigator().current(), Route::Home);
        // The wallet sits on an unexpected chain, so nothing reconnects.
        assert!(!app.session().is_connected());
        assert!(app.is_listening());
    }
}
