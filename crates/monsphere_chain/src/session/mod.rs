//! # Wallet Session
//!
//! The single process-wide wallet connection every page shares.
//!
//! The session is either connected (provider, signer and address all
//! present) or not (all absent). There is no other state. Subscribers learn
//! about transitions through [`SessionSubscription`]; dropping the
//! subscription unsubscribes.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::Address;
use monsphere_shared::{AddChainParams, NetworkConfig, WalletConfig};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::broadcast;

use crate::bindings::ContractRunner;
use crate::error::{ProviderError, WalletError};
use crate::provider::{methods, request_as, same_chain, Eip1193Provider, WalletNotification};

/// Capacity of the session event channel.
const EVENT_BUFFER: usize = 64;

/// A session transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A connection was established (or re-established for a new account).
    Connected(Address),
    /// The connection was cleared.
    Disconnected,
    /// The wallet changed chains. Bindings are chain-specific, so everything
    /// built on the old chain must be rebuilt.
    ReloadRequired {
        /// The chain the wallet moved to.
        chain_id: String,
    },
    /// A reconnect the wallet asked for (account change) failed. Carries the
    /// error so the user can be told.
    ConnectFailed(WalletError),
}

/// Signs transactions for one account through the wallet.
#[derive(Clone)]
pub struct Signer {
    provider: Arc<dyn Eip1193Provider>,
    address: Address,
}

impl Signer {
    /// Creates a signer for `address`.
    #[must_use]
    pub fn new(provider: Arc<dyn Eip1193Provider>, address: Address) -> Self {
        Self { provider, address }
    }

    /// The account this signer sends from.
    #[inline]
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The wallet behind this signer.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        &self.provider
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("address", &self.address).finish_non_exhaustive()
    }
}

/// An established connection: provider, signer and address.
#[derive(Clone)]
pub struct Connection {
    provider: Arc<dyn Eip1193Provider>,
    signer: Signer,
    chain_id: String,
}

impl Connection {
    /// The wallet provider.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        &self.provider
    }

    /// The signer for the connected account.
    #[must_use]
    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    /// The connected account.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.signer.address
    }

    /// Chain the wallet was on when the connection was made.
    #[must_use]
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Receives session transitions until dropped.
pub struct SessionSubscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Waits for the next transition. `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "session subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next transition if one is already queued.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

/// The process-wide wallet session.
///
/// Share it behind an `Arc`. All methods take `&self`.
pub struct WalletSession {
    /// Injected wallet, if any.
    wallet: Option<Arc<dyn Eip1193Provider>>,
    /// Provider used for reads while no wallet is connected.
    read_only: Option<Arc<dyn Eip1193Provider>>,
    /// Chain enforcement settings.
    network: NetworkConfig,
    /// Where to send users without a wallet.
    install_url: String,
    /// Current connection.
    state: RwLock<Option<Connection>>,
    /// Transition fan-out.
    events: broadcast::Sender<SessionEvent>,
}

impl WalletSession {
    /// Creates a disconnected session.
    ///
    /// # Arguments
    ///
    /// * `wallet` - The injected wallet, `None` if the user has none
    /// * `network` - Chain the wallet must be on
    /// * `wallet_config` - Wallet behaviour (install URL)
    #[must_use]
    pub fn new(
        wallet: Option<Arc<dyn Eip1193Provider>>,
        network: NetworkConfig,
        wallet_config: &WalletConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            wallet,
            read_only: None,
            network,
            install_url: wallet_config.install_url.clone(),
            state: RwLock::new(None),
            events,
        }
    }

    /// Attaches a provider used for reads while disconnected.
    #[must_use]
    pub fn with_read_only(mut self, provider: Arc<dyn Eip1193Provider>) -> Self {
        self.read_only = Some(provider);
        self
    }

    /// The injected wallet, if any.
    #[must_use]
    pub fn wallet(&self) -> Option<&Arc<dyn Eip1193Provider>> {
        self.wallet.as_ref()
    }

    /// The network settings the session enforces.
    #[must_use]
    pub const fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Where users without a wallet are sent.
    #[must_use]
    pub fn install_url(&self) -> &str {
        &self.install_url
    }

    /// The current connection.
    #[must_use]
    pub fn connection(&self) -> Option<Connection> {
        self.state.read().clone()
    }

    /// The connected address.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        self.state.read().as_ref().map(Connection::address)
    }

    /// Returns true while connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.read().is_some()
    }

    /// What contract bindings should run on: the signer when connected,
    /// else the read-only provider, else nothing.
    #[must_use]
    pub fn runner(&self) -> Option<ContractRunner> {
        if let Some(connection) = self.state.read().as_ref() {
            return Some(ContractRunner::Signer(connection.signer.clone()));
        }
        self.read_only.clone().map(ContractRunner::ReadOnly)
    }

    /// Subscribes to session transitions.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.events.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Connects to the wallet.
    ///
    /// Enforces the required chain first (switching, or registering then
    /// switching), then asks for accounts. On failure the session is left as
    /// it was.
    ///
    /// # Errors
    ///
    /// See [`WalletError`]; each variant has a user-facing message.
    pub async fn connect(&self) -> Result<Connection, WalletError> {
        let wallet = self.wallet.clone().ok_or_else(|| WalletError::NotInstalled {
            install_url: self.install_url.clone(),
        })?;

        self.ensure_chain(wallet.as_ref()).await?;

        let accounts: Vec<Address> = ask(wallet.as_ref(), methods::REQUEST_ACCOUNTS).await?;
        let address = *accounts.first().ok_or(WalletError::NoAccounts)?;

        let chain_id: String = ask(wallet.as_ref(), methods::CHAIN_ID).await?;

        let connection = Connection {
            provider: Arc::clone(&wallet),
            signer: Signer::new(wallet, address),
            chain_id,
        };
        *self.state.write() = Some(connection.clone());

        tracing::info!(%address, chain = connection.chain_id(), "wallet connected");
        let _ = self.events.send(SessionEvent::Connected(address));
        Ok(connection)
    }

    /// Clears the local connection.
    ///
    /// Wallet-side permissions are untouched; the protocol has no way to
    /// revoke them.
    pub fn disconnect(&self) {
        let previous = self.state.write().take();
        if let Some(connection) = previous {
            tracing::info!(address = %connection.address(), "wallet disconnected");
            let _ = self.events.send(SessionEvent::Disconnected);
        }
    }

    /// Connects without user interaction if the wallet already exposes an
    /// account on the required chain.
    ///
    /// # Errors
    ///
    /// Provider failures while probing, or any [`WalletSession::connect`] error.
    pub async fn auto_connect(&self) -> Result<Option<Connection>, WalletError> {
        let Some(wallet) = self.wallet.clone() else {
            return Ok(None);
        };

        let accounts: Vec<Address> = ask(wallet.as_ref(), methods::ACCOUNTS).await?;
        let current: String = ask(wallet.as_ref(), methods::CHAIN_ID).await?;
        let on_required_chain = self
            .network
            .required_chain()
            .map_or(true, |required| same_chain(&current, required));

        if accounts.is_empty() || !on_required_chain {
            tracing::debug!(accounts = accounts.len(), on_required_chain, "no auto-connect");
            return Ok(None);
        }
        self.connect().await.map(Some)
    }

    /// Applies a wallet notification.
    ///
    /// - accounts changed to none: disconnect
    /// - accounts changed to some: reconnect, publishing
    ///   [`SessionEvent::ConnectFailed`] if that fails
    /// - chain changed: clear everything and ask for a reload
    ///
    /// # Errors
    ///
    /// Reconnection failures.
    pub async fn handle_notification(
        &self,
        notification: WalletNotification,
    ) -> Result<(), WalletError> {
        match notification {
            WalletNotification::AccountsChanged(accounts) if accounts.is_empty() => {
                self.disconnect();
            }
            WalletNotification::AccountsChanged(_) => {
                if let Err(err) = self.connect().await {
                    let _ = self.events.send(SessionEvent::ConnectFailed(err.clone()));
                    return Err(err);
                }
            }
            WalletNotification::ChainChanged(chain_id) => {
                self.state.write().take();
                tracing::info!(chain = %chain_id, "wallet changed chain, reload required");
                let _ = self.events.send(SessionEvent::ReloadRequired { chain_id });
            }
        }
        Ok(())
    }

    /// Makes sure the wallet is on the required chain.
    async fn ensure_chain(&self, wallet: &dyn Eip1193Provider) -> Result<(), WalletError> {
        let Some(required) = self.network.required_chain() else {
            return Ok(());
        };

        let current: String = ask(wallet, methods::CHAIN_ID).await?;
        if same_chain(&current, required) {
            return Ok(());
        }

        tracing::info!(current = %current, required, "switching wallet chain");
        match switch_chain(wallet, required).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_unrecognized_chain() => {
                let params = self
                    .network
                    .add_chain
                    .as_ref()
                    .ok_or(WalletError::MissingChainParams)?;
                add_chain(wallet, params).await.map_err(WalletError::from_provider)?;
                switch_chain(wallet, required).await.map_err(switch_failure)
            }
            Err(err) => Err(switch_failure(err)),
        }
    }
}

/// Parameterless request whose result must decode as `T`.
async fn ask<T: DeserializeOwned>(
    wallet: &dyn Eip1193Provider,
    method: &str,
) -> Result<T, WalletError> {
    request_as(wallet, method, json!([]))
        .await
        .map_err(WalletError::from_provider)?
        .map_err(|detail| WalletError::Decode(format!("{method}: {detail}")))
}

async fn switch_chain(wallet: &dyn Eip1193Provider, chain_id: &str) -> Result<(), ProviderError> {
    wallet
        .request(methods::SWITCH_CHAIN, json!([{ "chainId": chain_id }]))
        .await
        .map(drop)
}

async fn add_chain(wallet: &dyn Eip1193Provider, params: &AddChainParams) -> Result<(), ProviderError> {
    tracing::info!(chain = %params.chain_id, name = %params.chain_name, "registering chain with wallet");
    wallet
        .request(methods::ADD_CHAIN, json!([params]))
        .await
        .map(drop)
}

fn switch_failure(err: ProviderError) -> WalletError {
    if err.is_user_rejected() {
        WalletError::Rejected
    } else {
        tracing::warn!(%err, "chain switch failed");
        WalletError::WrongNetwork
    }
}
