//! Chat history: every session the account took part in, refreshed on a
//! fixed period. Rows that fail to load are skipped.

use std::fmt::Write as _;
use std::sync::Arc;

use monsphere_chain::contracts::sort_sessions_newest_first;
use monsphere_chain::{Address, SessionRow, U256};
use parking_lot::Mutex;

use super::{format_ts, short, submit, ViewContext};
use crate::polling::PollHandle;

/// History view state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryState {
    /// Sessions, newest first.
    pub rows: Vec<SessionRow>,
    /// A load is in progress.
    pub loading: bool,
    /// A close is in flight.
    pub closing: Option<U256>,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            loading: true,
            closing: None,
        }
    }
}

struct Shared {
    ctx: ViewContext,
    state: Mutex<HistoryState>,
}

impl Shared {
    async fn load_for(&self, user: Address) {
        let Some(contracts) = self.ctx.contracts() else {
            return;
        };
        self.state.lock().loading = true;

        let ids = match contracts.chats.get_my_sessions(user).await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(%err, "loading history failed");
                self.state.lock().loading = false;
                return;
            }
        };

        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            match contracts.chats.session(id).await {
                Ok(row) => rows.push(row),
                Err(err) => tracing::warn!(%id, %err, "skipping session"),
            }
        }
        sort_sessions_newest_first(&mut rows);

        let mut state = self.state.lock();
        state.rows = rows;
        state.loading = false;
    }
}

/// History view.
pub struct HistoryView {
    shared: Arc<Shared>,
    poll: Mutex<Option<PollHandle>>,
}

impl HistoryView {
    /// Creates the view.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            shared: Arc::new(Shared {
                ctx,
                state: Mutex::new(HistoryState::default()),
            }),
            poll: Mutex::new(None),
        }
    }

    /// Snapshot of the state.
    #[must_use]
    pub fn state(&self) -> HistoryState {
        self.shared.state.lock().clone()
    }

    /// Loads, then reloads every `history_interval`. A tick is skipped
    /// once the mounting account is no longer connected.
    pub async fn mount(&self) {
        let Some(me) = self.shared.ctx.address() else {
            return;
        };
        self.shared.load_for(me).await;

        let shared = Arc::clone(&self.shared);
        let handle = PollHandle::every(self.shared.ctx.polling.history_interval(), move || {
            let shared = Arc::clone(&shared);
            async move {
                if shared.ctx.address() == Some(me) {
                    shared.load_for(me).await;
                }
            }
        });
        *self.poll.lock() = Some(handle);
    }

    /// Stops the periodic reload.
    pub fn unmount(&self) {
        self.poll.lock().take();
    }

    /// Returns true while the periodic reload runs.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poll.lock().as_ref().is_some_and(PollHandle::is_running)
    }

    /// Loads the connected account's sessions.
    pub async fn load(&self) {
        if let Some(me) = self.shared.ctx.address() {
            self.shared.load_for(me).await;
        }
    }

    /// Loads `user`'s sessions.
    pub async fn load_for(&self, user: Address) {
        self.shared.load_for(user).await;
    }

    /// Closes a session after confirmation, then reloads.
    pub async fn close_session(&self, id: U256) {
        if self.shared.state.lock().closing.is_some() {
            return;
        }
        if !self
            .shared
            .ctx
            .notifier
            .confirm("Are you sure you want to close this session?")
        {
            return;
        }
        self.shared.state.lock().closing = Some(id);
        let receipt = submit(&self.shared.ctx, "Failed to close session", |contracts| async move {
            contracts.chats.end_session(id).await
        })
        .await;
        self.shared.state.lock().closing = None;
        if receipt.is_some() {
            self.load().await;
        }
    }

    /// The full-page loader shows only before any row is known.
    #[must_use]
    pub fn shows_full_page_loader(&self) -> bool {
        let state = self.shared.state.lock();
        state.loading && state.rows.is_empty()
    }

    /// Text rendering. `viewer` picks the peer column.
    #[must_use]
    pub fn render_for(&self, viewer: Address) -> String {
        let state = self.state();
        let mut out = String::from("Chat History\n");
        if state.loading && state.rows.is_empty() {
            out.push_str("Loading…\n");
            return out;
        }
        if state.rows.is_empty() {
            out.push_str("No chat sessions yet\n");
            return out;
        }
        for row in &state.rows {
            let status = if row.closed { "Closed" } else { "Open" };
            let id = format!("#{}", row.id);
            let _ = writeln!(
                out,
                "{id:<7} {:<14} {:<20} {status}",
                short(row.peer_of(viewer)),
                format_ts(row.created_at),
            );
        }
        out
    }

    /// Text rendering for the connected account.
    #[must_use]
    pub fn render(&self) -> String {
        match self.shared.ctx.address() {
            Some(me) => self.render_for(me),
            None => "Chat History\nConnect your wallet to see your history.\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::fixtures::{self, addresses, bob, me};
    use alloy_sol_types::SolCall;
    use monsphere_chain::contracts::IChats;
    use monsphere_chain::testing::ScriptedWallet;
    use monsphere_chain::ProviderError;
    use std::time::Duration;

    /// Sessions 1..=3; session 2 cannot be read.
    fn script_history(wallet: &ScriptedWallet) {
        wallet.on_call(addresses().chats, |_: IChats::getMySessionsCall| {
            IChats::getMySessionsCall::abi_encode_returns(&(vec![
                U256::from(1),
                U256::from(2),
                U256::from(3),
            ],))
        });
        wallet.on_call_result(addresses().chats, |call: IChats::sessionsCall| {
            if call.id == U256::from(2) {
                return Err(ProviderError::new(-32_000, "execution reverted"));
            }
            Ok(IChats::sessionsCall::abi_encode_returns(&(
                bob(),
                me(),
                call.id == U256::from(3),
                String::new(),
                call.id * U256::from(100),
            )))
        });
    }

    #[tokio::test]
    async fn test_failing_row_is_skipped() {
        let harness = fixtures::connected().await;
        script_history(&harness.wallet);
        let view = HistoryView::new(harness.ctx.clone());
        assert!(view.shows_full_page_loader());

        view.load().await;

        let ids: Vec<U256> = view.state().rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![U256::from(3), U256::from(1)]);
        assert!(!view.shows_full_page_loader());
        let rendered = view.render();
        assert!(rendered.contains("Closed"));
        assert!(rendered.contains(&short(bob())));
    }

    #[tokio::test]
    async fn test_empty_history() {
        let harness = fixtures::connected().await;
        harness.wallet.on_call(addresses().chats, |_: IChats::getMySessionsCall| {
            IChats::getMySessionsCall::abi_encode_returns(&(Vec::<U256>::new(),))
        });
        let view = HistoryView::new(harness.ctx.clone());

        view.load().await;

        assert!(view.render().contains("No chat sessions yet"));
    }

    #[tokio::test]
    async fn test_close_session_confirms_then_reloads() {
        let harness = fixtures::connected().await;
        script_history(&harness.wallet);
        let view = HistoryView::new(harness.ctx.clone());

        harness.notifier.answer_next(false);
        view.close_session(U256::from(1)).await;
        assert_eq!(harness.wallet.transaction_count(), 0);

        view.close_session(U256::from(1)).await;
        let ended = harness.wallet.sent::<IChats::endSessionCall>(addresses().chats);
        assert_eq!(ended.len(), 1);
        assert_eq!(ended[0].id, U256::from(1));
        assert_eq!(
            harness.wallet.calls_to::<IChats::getMySessionsCall>(addresses().chats).len(),
            1
        );
        assert_eq!(view.state().closing, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_reload_stops_on_unmount() {
        let harness = fixtures::connected().await;
        script_history(&harness.wallet);
        let view = HistoryView::new(harness.ctx.clone());
        let list_calls =
            || harness.wallet.calls_to::<IChats::getMySessionsCall>(addresses().chats).len();

        view.mount().await;
        assert_eq!(list_calls(), 1);

        tokio::time::advance(Duration::from_secs(10)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(list_calls(), 2);

        view.unmount();
        assert!(!view.is_polling());
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reads_after_disconnect() {
        let harness = fixtures::connected_with_read_only().await;
        script_history(&harness.wallet);
        let view = HistoryView::new(harness.ctx.clone());
        view.mount().await;
        let calls = harness.wallet.count("eth_call");

        harness.ctx.session.disconnect();
        tokio::time::advance(Duration::from_secs(30)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        assert_eq!(harness.wallet.count("eth_call"), calls);
    }
}
