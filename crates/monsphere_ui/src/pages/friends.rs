//! Friends: find a user by username and act on the relation.
//!
//! | relation          | actions          |
//! |-------------------|------------------|
//! | none              | send request     |
//! | request sent      | (waiting)        |
//! | request received  | accept, decline  |
//! | friends           | remove           |

use std::fmt::Write as _;

use monsphere_chain::{Address, ContractError, Relation};
use parking_lot::Mutex;

use super::{short, submit, ViewContext};

/// An action on the found user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FriendAction {
    /// Send a friend request.
    SendRequest,
    /// Accept their request.
    Accept,
    /// Decline their request.
    Decline,
    /// End the friendship.
    Remove,
}

impl FriendAction {
    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SendRequest => "Send Friend Request",
            Self::Accept => "Accept",
            Self::Decline => "Decline",
            Self::Remove => "Remove Friend",
        }
    }

    /// Relation once the action is mined.
    #[must_use]
    pub const fn resulting_relation(self) -> Relation {
        match self {
            Self::SendRequest => Relation::RequestSent,
            Self::Accept => Relation::Friends,
            Self::Decline | Self::Remove => Relation::None,
        }
    }
}

/// Actions offered for `relation` with someone other than yourself.
#[must_use]
pub fn actions_for(relation: Relation) -> &'static [FriendAction] {
    match relation {
        Relation::None => &[FriendAction::SendRequest],
        Relation::RequestSent => &[],
        Relation::RequestReceived => &[FriendAction::Accept, FriendAction::Decline],
        Relation::Friends => &[FriendAction::Remove],
    }
}

/// Friends view state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FriendsState {
    /// Username input.
    pub username: String,
    /// Address of the found user.
    pub found: Option<Address>,
    /// Relation with the found user.
    pub relation: Relation,
    /// Lookup in progress.
    pub loading: bool,
    /// An action is in flight; every action button is disabled.
    pub action_in_flight: bool,
}

/// Friends view.
pub struct FriendsView {
    ctx: ViewContext,
    state: Mutex<FriendsState>,
}

impl FriendsView {
    /// Creates the view.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(FriendsState::default()),
        }
    }

    /// Snapshot of the state.
    #[must_use]
    pub fn state(&self) -> FriendsState {
        self.state.lock().clone()
    }

    /// Sets the username input.
    pub fn set_username(&self, value: &str) {
        self.state.lock().username = value.to_string();
    }

    /// Looks up the username input from the connected account's view.
    pub async fn lookup(&self) {
        let me = self.ctx.address();
        self.lookup_for(me).await;
    }

    /// Looks up the username input. The relation is only read when `me` is
    /// known.
    pub async fn lookup_for(&self, me: Option<Address>) {
        let username = self.state.lock().username.trim().to_string();
        if username.is_empty() {
            return;
        }
        let Some(contracts) = self.ctx.contracts() else {
            return;
        };
        self.state.lock().loading = true;

        let result = async {
            let found = contracts.user_registry.address_of_username(&username).await?;
            if found == Address::ZERO {
                return Ok(None);
            }
            let relation = match me {
                Some(me) => contracts.friend_system.get_relation(me, found).await?,
                None => Relation::None,
            };
            Ok::<_, ContractError>(Some((found, relation)))
        }
        .await;

        let mut state = self.state.lock();
        state.loading = false;
        match result {
            Ok(Some((found, relation))) => {
                state.found = Some(found);
                state.relation = relation;
            }
            Ok(None) => {
                state.found = None;
                state.relation = Relation::None;
            }
            Err(err) => {
                tracing::error!(%username, %err, "lookup failed");
                state.found = None;
                state.relation = Relation::None;
            }
        }
    }

    /// Actions offered for the found user. Looking up yourself offers none.
    #[must_use]
    pub fn available_actions(&self) -> Vec<FriendAction> {
        let state = self.state.lock();
        let Some(found) = state.found else {
            return Vec::new();
        };
        if self.ctx.address() == Some(found) {
            return Vec::new();
        }
        actions_for(state.relation).to_vec()
    }

    /// Buttons are enabled while no action is in flight.
    #[must_use]
    pub fn actions_enabled(&self) -> bool {
        !self.state.lock().action_in_flight
    }

    /// Runs an action on the found user.
    ///
    /// Actions not offered for the current relation are ignored. Removing a
    /// friend asks for confirmation first.
    pub async fn act(&self, action: FriendAction) {
        let me = self.ctx.address();
        let target = {
            let mut state = self.state.lock();
            if state.action_in_flight {
                return;
            }
            let Some(found) = state.found else {
                return;
            };
            if me == Some(found) || !actions_for(state.relation).contains(&action) {
                return;
            }
            state.action_in_flight = true;
            found
        };
        if action == FriendAction::Remove && !self.ctx.notifier.confirm("Remove this friend?") {
            self.state.lock().action_in_flight = false;
            return;
        }

        let fallback = match action {
            FriendAction::SendRequest => "Failed to send friend request",
            FriendAction::Accept => "Failed to accept friend request",
            FriendAction::Decline => "Failed to decline friend request",
            FriendAction::Remove => "Failed to remove friend",
        };
        let receipt = submit(&self.ctx, fallback, |contracts| async move {
            let friends = &contracts.friend_system;
            match action {
                FriendAction::SendRequest => friends.send_friend_request(target).await,
                FriendAction::Accept => friends.accept_friend_request(target).await,
                FriendAction::Decline => friends.decline_friend_request(target).await,
                FriendAction::Remove => friends.remove_friend(target).await,
            }
        })
        .await;

        let mut state = self.state.lock();
        state.action_in_flight = false;
        if receipt.is_some() {
            state.relation = action.resulting_relation();
        }
    }

    /// Text rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let state = self.state();
        let mut out = String::from("Friends\n");
        if state.loading {
            out.push_str("Searching…\n");
            return out;
        }
        let Some(found) = state.found else {
            if !state.username.trim().is_empty() {
                out.push_str("No user found\n");
            }
            return out;
        };
        let _ = writeln!(out, "{} ({})", state.username.trim(), short(found));
        let status = match state.relation {
            Relation::None => "Not friends",
            Relation::RequestSent => "Request sent",
            Relation::RequestReceived => "Request received",
            Relation::Friends => "Friends",
        };
        let _ = writeln!(out, "Status: {status}");
        for action in self.available_actions() {
            let _ = writeln!(out, "[{}]", action.label());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::fixtures::{self, addresses, bob, me};
    use alloy_sol_types::SolCall;
    use monsphere_chain::contracts::{IFriendSystem, IUserRegistry};
    use monsphere_chain::testing::{ScriptedWallet, TxOutcome};

    fn script_lookup(wallet: &ScriptedWallet, relation: u8) {
        wallet.on_call(addresses().user_registry, |call: IUserRegistry::addressOfUsernameCall| {
            let found = match call.username.as_str() {
                "bob" => bob(),
                "me" => me(),
                _ => Address::ZERO,
            };
            IUserRegistry::addressOfUsernameCall::abi_encode_returns(&(found,))
        });
        wallet.on_call(addresses().friend_system, move |_: IFriendSystem::getRelationCall| {
            IFriendSystem::getRelationCall::abi_encode_returns(&(relation,))
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_actions_send_once() {
        let harness = fixtures::connected_with(fixtures::wallet().with_receipt_delay(2)).await;
        script_lookup(&harness.wallet, 0);
        let view = FriendsView::new(harness.ctx.clone());
        view.set_username("bob");
        view.lookup().await;

        tokio::join!(
            view.act(FriendAction::SendRequest),
            view.act(FriendAction::SendRequest)
        );

        assert_eq!(
            harness
                .wallet
                .sent::<IFriendSystem::sendFriendRequestCall>(addresses().friend_system)
                .len(),
            1
        );
        assert_eq!(view.state().relation, Relation::RequestSent);
        assert!(view.actions_enabled());
    }

    #[tokio::test]
    async fn test_declined_removal_releases_actions() {
        let harness = fixtures::connected().await;
        script_lookup(&harness.wallet, 3);
        let view = FriendsView::new(harness.ctx.clone());
        view.set_username("bob");
        view.lookup().await;

        harness.notifier.answer_next(false);
        view.act(FriendAction::Remove).await;

        assert!(view.actions_enabled());
        assert_eq!(harness.wallet.transaction_count(), 0);
        assert_eq!(view.state().relation, Relation::Friends);
    }

    #[test]
    fn test_actions_by_relation() {
        assert_eq!(actions_for(Relation::None), &[FriendAction::SendRequest]);
        assert!(actions_for(Relation::RequestSent).is_empty());
        assert_eq!(
            actions_for(Relation::RequestReceived),
            &[FriendAction::Accept, FriendAction::Decline]
        );
        assert_eq!(actions_for(Relation::Friends), &[FriendAction::Remove]);
    }

    #[tokio::test]
    async fn test_unknown_user_resets_relation() {
        let harness = fixtures::connected().await;
        script_lookup(&harness.wallet, 3);
        let view = FriendsView::new(harness.ctx.clone());

        view.set_username("bob");
        view.lookup().await;
        assert_eq!(view.state().relation, Relation::Friends);

        view.set_username("nobody");
        view.lookup().await;
        let state = view.state();
        assert_eq!(state.found, None);
        assert_eq!(state.relation, Relation::None);
        assert!(view.render().contains("No user found"));
    }

    #[tokio::test]
    async fn test_yourself_has_no_actions() {
        let harness = fixtures::connected().await;
        script_lookup(&harness.wallet, 0);
        let view = FriendsView::new(harness.ctx.clone());

        view.set_username("me");
        view.lookup().await;

        assert_eq!(view.state().found, Some(me()));
        assert!(view.available_actions().is_empty());
    }

    #[tokio::test]
    async fn test_accept_received_request() {
        let harness = fixtures::connected().await;
        script_lookup(&harness.wallet, 2);
        let view = FriendsView::new(harness.ctx.clone());
        view.set_username("bob");
        view.lookup().await;
        assert_eq!(
            view.available_actions(),
            vec![FriendAction::Accept, FriendAction::Decline]
        );

        view.act(FriendAction::Remove).await;
        assert_eq!(harness.wallet.transaction_count(), 0);

        view.act(FriendAction::Accept).await;

        let accepted = harness
            .wallet
            .sent::<IFriendSystem::acceptFriendRequestCall>(addresses().friend_system);
        assert_eq!(accepted[0].from, bob());
        assert_eq!(view.state().relation, Relation::Friends);
        assert!(view.actions_enabled());
    }

    #[tokio::test]
    async fn test_remove_needs_confirmation() {
        let harness = fixtures::connected().await;
        script_lookup(&harness.wallet, 3);
        let view = FriendsView::new(harness.ctx.clone());
        view.set_username("bob");
        view.lookup().await;

        harness.notifier.answer_next(false);
        view.act(FriendAction::Remove).await;
        assert_eq!(harness.wallet.transaction_count(), 0);
        assert_eq!(view.state().relation, Relation::Friends);

        view.act(FriendAction::Remove).await;
        assert_eq!(view.state().relation, Relation::None);
    }

    #[tokio::test]
    async fn test_failed_request_keeps_relation() {
        let harness = fixtures::connected().await;
        script_lookup(&harness.wallet, 0);
        harness.wallet.on_send(
            addresses().friend_system,
            |_: IFriendSystem::sendFriendRequestCall| TxOutcome::Reverted,
        );
        let view = FriendsView::new(harness.ctx.clone());
        view.set_username("bob");
        view.lookup().await;

        view.act(FriendAction::SendRequest).await;

        assert_eq!(view.state().relation, Relation::None);
        let alerts = harness.notifier.drain_alerts();
        assert!(alerts[0].starts_with("Failed to send friend request: "));
    }
}
