//! # Chats
//!
//! 1:1 sessions plus the group actions.
//!
//! ```text
//!   mount ──▶ getMySessions ──▶ sessions(id) × n ──▶ sort newest first
//!                                                          │
//!   every chats_interval:  getLastCid(active) ──▶ patch active row only
//! ```
//!
//! Groups cannot be listed from the chain, so group ids are typed in.

use std::fmt::Write as _;
use std::sync::Arc;

use monsphere_chain::contracts::sort_sessions_newest_first;
use monsphere_chain::{Address, ContractError, SessionRow, U256};
use parking_lot::Mutex;

use super::{format_ts, parse_address, parse_id, short, submit, ViewContext};
use crate::polling::PollHandle;

/// Chats view state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatsState {
    /// Sessions, newest first.
    pub sessions: Vec<SessionRow>,
    /// Selected session.
    pub active: Option<U256>,
    /// True until the first load finishes.
    pub loading: bool,
    /// Peer address input for a new session.
    pub new_peer: String,
    /// Message input for the active session.
    pub message: String,
    /// Group name input.
    pub group_name: String,
    /// Comma-separated member addresses for a new group.
    pub group_members: String,
    /// Group id input.
    pub group_id: String,
    /// Member address input for add/remove.
    pub member_addr: String,
    /// Group message input.
    pub group_message: String,
    /// A write is in flight.
    pub submitting: bool,
}

impl Default for ChatsState {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            active: None,
            loading: true,
            new_peer: String::new(),
            message: String::new(),
            group_name: String::new(),
            group_members: String::new(),
            group_id: String::new(),
            member_addr: String::new(),
            group_message: String::new(),
            submitting: false,
        }
    }
}

impl ChatsState {
    /// The selected row.
    #[must_use]
    pub fn active_row(&self) -> Option<&SessionRow> {
        let active = self.active?;
        self.sessions.iter().find(|row| row.id == active)
    }
}

struct Shared {
    ctx: ViewContext,
    state: Mutex<ChatsState>,
}

impl Shared {
    async fn load_sessions(&self) {
        let (Some(me), Some(contracts)) = (self.ctx.address(), self.ctx.contracts()) else {
            return;
        };

        let result = async {
            let ids = contracts.chats.get_my_sessions(me).await?;
            let mut rows = Vec::with_capacity(ids.len());
            for id in ids {
                rows.push(contracts.chats.session(id).await?);
            }
            Ok::<_, ContractError>(rows)
        }
        .await;

        let mut state = self.state.lock();
        state.loading = false;
        match result {
            Ok(mut rows) => {
                sort_sessions_newest_first(&mut rows);
                if state.active.is_none() {
                    state.active = rows.first().map(|row| row.id);
                }
                tracing::debug!(count = rows.len(), "sessions loaded");
                state.sessions = rows;
            }
            Err(err) => tracing::error!(%err, "loading sessions failed"),
        }
    }

    async fn refresh_active(&self) {
        let Some(active) = self.state.lock().active else {
            return;
        };
        let Some(contracts) = self.ctx.contracts() else {
            return;
        };
        match contracts.chats.get_last_cid(active).await {
            Ok(cid) => {
                let mut state = self.state.lock();
                if let Some(row) = state.sessions.iter_mut().find(|row| row.id == active) {
                    row.last_cid = cid;
                }
            }
            Err(err) => tracing::debug!(%err, "last message refresh failed"),
        }
    }
}

/// Chats view.
pub struct ChatsView {
    shared: Arc<Shared>,
    poll: Mutex<Option<PollHandle>>,
}

impl ChatsView {
    /// Creates the view. Call [`ChatsView::mount`] to load and start polling.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            shared: Arc::new(Shared {
                ctx,
                state: Mutex::new(ChatsState::default()),
            }),
            poll: Mutex::new(None),
        }
    }

    /// Snapshot of the state.
    #[must_use]
    pub fn state(&self) -> ChatsState {
        self.shared.state.lock().clone()
    }

    /// Loads the sessions, then polls the active one.
    pub async fn mount(&self) {
        self.load_sessions().await;
        self.start_polling();
    }

    /// Re-reads every session row.
    ///
    /// Any failing row fails the whole load; the previous rows stay.
    pub async fn load_sessions(&self) {
        self.shared.load_sessions().await;
    }

    /// Fetches the active session's latest message id.
    pub async fn refresh_active(&self) {
        self.shared.refresh_active().await;
    }

    /// Starts the poll of the active session. No-op while disconnected, and
    /// ticks after a disconnect read nothing.
    pub fn start_polling(&self) {
        if !self.shared.ctx.session.is_connected() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let handle = PollHandle::every(self.shared.ctx.polling.chats_interval(), move || {
            let shared = Arc::clone(&shared);
            async move {
                if shared.ctx.session.is_connected() {
                    shared.refresh_active().await;
                }
            }
        });
        *self.poll.lock() = Some(handle);
    }

    /// Stops the poll.
    pub fn stop_polling(&self) {
        self.poll.lock().take();
    }

    /// Returns true while the poll runs.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poll.lock().as_ref().is_some_and(PollHandle::is_running)
    }

    /// Selects a session.
    pub fn select(&self, id: U256) {
        self.shared.state.lock().active = Some(id);
    }

    /// Sets the new-session peer input.
    pub fn set_new_peer(&self, value: &str) {
        self.shared.state.lock().new_peer = value.to_string();
    }

    /// Sets the message input.
    pub fn set_message(&self, value: &str) {
        self.shared.state.lock().message = value.to_string();
    }

    /// Sets the group name input.
    pub fn set_group_name(&self, value: &str) {
        self.shared.state.lock().group_name = value.to_string();
    }

    /// Sets the group members input.
    pub fn set_group_members(&self, value: &str) {
        self.shared.state.lock().group_members = value.to_string();
    }

    /// Sets the group id input.
    pub fn set_group_id(&self, value: &str) {
        self.shared.state.lock().group_id = value.to_string();
    }

    /// Sets the member address input.
    pub fn set_member_addr(&self, value: &str) {
        self.shared.state.lock().member_addr = value.to_string();
    }

    /// Sets the group message input.
    pub fn set_group_message(&self, value: &str) {
        self.shared.state.lock().group_message = value.to_string();
    }

    /// Opens a session with the peer input.
    pub async fn create_session(&self) {
        let input = self.shared.state.lock().new_peer.clone();
        let Some(peer) = parse_address(&input) else {
            self.shared.ctx.notifier.alert("Invalid address");
            return;
        };
        if self
            .write("Failed to create session", |contracts| async move {
                contracts.chats.create_session(peer).await
            })
            .await
        {
            self.shared.state.lock().new_peer.clear();
            self.load_sessions().await;
        }
    }

    /// Sends the message input to the active session.
    pub async fn send(&self) {
        let (id, text) = {
            let state = self.shared.state.lock();
            let Some(row) = state.active_row() else {
                return;
            };
            let text = state.message.trim().to_string();
            if row.closed || text.is_empty() {
                return;
            }
            (row.id, text)
        };
        if self
            .write("Failed to send message", |contracts| async move {
                contracts.chats.send_message(id, &text).await
            })
            .await
        {
            self.shared.state.lock().message.clear();
            self.load_sessions().await;
        }
    }

    /// End is offered for an open active session.
    #[must_use]
    pub fn can_end(&self) -> bool {
        let state = self.shared.state.lock();
        !state.submitting && state.active_row().is_some_and(|row| !row.closed)
    }

    /// Ends the active session after confirmation.
    pub async fn end(&self) {
        if !self.can_end() {
            return;
        }
        let Some(id) = self.shared.state.lock().active else {
            return;
        };
        if !self.shared.ctx.notifier.confirm("End this session?") {
            return;
        }
        if self
            .write("Failed to end session", |contracts| async move {
                contracts.chats.end_session(id).await
            })
            .await
        {
            self.load_sessions().await;
        }
    }

    /// Creates a group from the name and members inputs.
    pub async fn create_group(&self) {
        let (name, members) = {
            let state = self.shared.state.lock();
            (state.group_name.trim().to_string(), state.group_members.clone())
        };
        if name.is_empty() {
            return;
        }
        let members = match parse_members(&members) {
            Ok(members) => members,
            Err(bad) => {
                self.shared
                    .ctx
                    .notifier
                    .alert(&format!("Invalid member address: {bad}"));
                return;
            }
        };
        if self
            .write("Failed to create group", |contracts| async move {
                contracts.chats.create_group(&name, members).await
            })
            .await
        {
            let mut state = self.shared.state.lock();
            state.group_name.clear();
            state.group_members.clear();
            drop(state);
            self.shared.ctx.notifier.alert("Group created");
        }
    }

    /// Adds the member input to the group id input.
    pub async fn add_member(&self) {
        let Some((group_id, member)) = self.group_target() else {
            return;
        };
        if self
            .write("Failed to add member", |contracts| async move {
                contracts.chats.add_member(group_id, member).await
            })
            .await
        {
            self.shared.ctx.notifier.alert("Member added");
        }
    }

    /// Removes the member input from the group id input.
    pub async fn remove_member(&self) {
        let Some((group_id, member)) = self.group_target() else {
            return;
        };
        if self
            .write("Failed to remove member", |contracts| async move {
                contracts.chats.remove_member(group_id, member).await
            })
            .await
        {
            self.shared.ctx.notifier.alert("Member removed");
        }
    }

    /// Posts the group message input to the group id input.
    pub async fn send_group_message(&self) {
        let (group_id, text) = {
            let state = self.shared.state.lock();
            (state.group_id.clone(), state.group_message.trim().to_string())
        };
        let Some(group_id) = parse_id(&group_id) else {
            self.shared.ctx.notifier.alert("Invalid group id");
            return;
        };
        if text.is_empty() {
            return;
        }
        if self
            .write("Failed to send group message", |contracts| async move {
                contracts.chats.send_group_message(group_id, &text).await
            })
            .await
        {
            self.shared.state.lock().group_message.clear();
            self.shared.ctx.notifier.alert("Message sent");
        }
    }

    /// Text rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let state = self.state();
        let mut out = String::from("Chats\n");
        let Some(me) = self.shared.ctx.address() else {
            out.push_str("Connect your wallet to see your chats.\n");
            return out;
        };
        if state.loading {
            out.push_str("Loading…\n");
            return out;
        }
        if state.sessions.is_empty() {
            out.push_str("No sessions yet\n");
        }
        for row in &state.sessions {
            let marker = if Some(row.id) == state.active { '>' } else { ' ' };
            let _ = write!(out, "{marker} #{} with {}", row.id, short(row.peer_of(me)));
            if row.closed {
                out.push_str(" (closed)");
            }
            let _ = writeln!(out, "  {}", format_ts(row.created_at));
        }
        if let Some(row) = state.active_row() {
            out.push('\n');
            if row.last_cid.is_empty() {
                out.push_str("No messages yet\n");
            } else {
                let _ = writeln!(out, "Last message: {}", row.last_cid);
            }
        }
        out
    }

    fn group_target(&self) -> Option<(U256, Address)> {
        let (group_id, member) = {
            let state = self.shared.state.lock();
            (state.group_id.clone(), state.member_addr.clone())
        };
        let Some(group_id) = parse_id(&group_id) else {
            self.shared.ctx.notifier.alert("Invalid group id");
            return None;
        };
        let Some(member) = parse_address(&member) else {
            self.shared.ctx.notifier.alert("Invalid address");
            return None;
        };
        Some((group_id, member))
    }

    async fn write<F, Fut>(&self, fallback: &str, write: F) -> bool
    where
        F: FnOnce(monsphere_chain::Contracts) -> Fut,
        Fut: std::future::Future<
            Output = Result<monsphere_chain::PendingTransaction, ContractError>,
        >,
    {
        {
            let mut state = self.shared.state.lock();
            if state.submitting {
                return false;
            }
            state.submitting = true;
        }
        let receipt = submit(&self.shared.ctx, fallback, write).await;
        self.shared.state.lock().submitting = false;
        receipt.is_some()
    }
}

/// Splits comma-separated addresses, dropping empty entries.
///
/// # Errors
///
/// Returns the first entry that is not an address.
pub fn parse_members(input: &str) -> Result<Vec<Address>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_address(entry).ok_or_else(|| entry.to_string()))
        .collect()
}
