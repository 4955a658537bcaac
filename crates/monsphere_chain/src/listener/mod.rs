//! # Wallet Listener
//!
//! Forwards wallet notifications into the session.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Wallet     │ ──▶ │   Listener   │ ──▶ │   Session    │ ──▶ subscribers
//! │ (broadcast)  │     │   (task)     │     │ (transitions)│
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The listener owns one wallet subscription. Stopping or dropping it
//! removes that subscription, so no listener outlives the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::provider::WalletNotification;
use crate::session::WalletSession;

/// Counters for the notification listener.
#[derive(Debug, Default)]
pub struct ListenerStats {
    /// Total notifications received.
    pub notifications_received: AtomicU64,
    /// `accountsChanged` notifications.
    pub accounts_changed: AtomicU64,
    /// `chainChanged` notifications.
    pub chain_changed: AtomicU64,
    /// Notifications whose handling failed (for example a refused reconnect).
    pub errors: AtomicU64,
}

/// Background task feeding wallet notifications to a [`WalletSession`].
pub struct WalletListener {
    task: JoinHandle<()>,
    stats: Arc<ListenerStats>,
}

impl WalletListener {
    /// Starts listening. Must be called inside a tokio runtime.
    ///
    /// # Returns
    ///
    /// `None` if the session has no wallet to listen to.
    #[must_use]
    pub fn spawn(session: Arc<WalletSession>) -> Option<Self> {
        let mut notifications = session.wallet()?.subscribe();
        let stats = Arc::new(ListenerStats::default());
        let task_stats = Arc::clone(&stats);

        let task = tokio::spawn(async move {
            loop {
                let notification = match notifications.recv().await {
                    Ok(notification) => notification,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "wallet notifications dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                task_stats.notifications_received.fetch_add(1, Ordering::Relaxed);
                match &notification {
                    WalletNotification::AccountsChanged(_) => {
                        task_stats.accounts_changed.fetch_add(1, Ordering::Relaxed);
                    }
                    WalletNotification::ChainChanged(_) => {
                        task_stats.chain_changed.fetch_add(1, Ordering::Relaxed);
                    }
                }

                if let Err(err) = session.handle_notification(notification).await {
                    task_stats.errors.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(%err, "failed to apply wallet notification");
                }
            }
            tracing::debug!("wallet notification stream closed");
        });

        Some(Self { task, stats })
    }

    /// Returns true until the task ends or is stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Returns a reference to the statistics.
    #[must_use]
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Stops the listener and drops its wallet subscription.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for WalletListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Eip1193Provider;
    use crate::session::SessionEvent;
    use crate::testing::ScriptedWallet;
    use alloy_primitives::Address;
    use monsphere_shared::{NetworkConfig, WalletConfig};

    fn connected() -> (Arc<ScriptedWallet>, Arc<WalletSession>) {
        let wallet = Arc::new(ScriptedWallet::new().with_accounts(vec![Address::repeat_byte(1)]));
        let session = Arc::new(WalletSession::new(
            Some(wallet.clone() as Arc<dyn Eip1193Provider>),
            NetworkConfig::default(),
            &WalletConfig::default(),
        ));
        (wallet, session)
    }

    #[tokio::test]
    async fn test_no_wallet_no_listener() {
        let session = Arc::new(WalletSession::new(
            None,
            NetworkConfig::default(),
            &WalletConfig::default(),
        ));
        assert!(WalletListener::spawn(session).is_none());
    }

    #[tokio::test]
    async fn test_accounts_cleared_disconnects() {
        let (wallet, session) = connected();
        session.connect().await.unwrap();
        let mut sub = session.subscribe();
        let listener = WalletListener::spawn(Arc::clone(&session)).unwrap();

        wallet.emit_accounts_changed(vec![]);

        assert_eq!(sub.recv().await, Some(SessionEvent::Disconnected));
        assert!(!session.is_connected());
        assert_eq!(listener.stats().accounts_changed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_chain_change_requests_reload() {
        let (wallet, session) = connected();
        session.connect().await.unwrap();
        let mut sub = session.subscribe();
        let _listener = WalletListener::spawn(Arc::clone(&session)).unwrap();

        wallet.emit_chain_changed("0x1");

        assert_eq!(
            sub.recv().await,
            Some(SessionEvent::ReloadRequired { chain_id: "0x1".into() })
        );
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_stop_unsubscribes() {
        let (wallet, session) = connected();
        let listener = WalletListener::spawn(session).unwrap();
        assert_eq!(wallet.listener_count(), 1);

        drop(listener);
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(wallet.listener_count(), 0);
    }
}
