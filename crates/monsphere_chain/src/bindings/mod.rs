//! # Contract Bindings
//!
//! Typed handles to the four MonSphere contracts.
//!
//! Each handle method is exactly one contract call: reads go through
//! `eth_call`, writes through `eth_sendTransaction` and come back as a
//! [`PendingTransaction`]. There is no retry, caching or batching here.
//!
//! Handles are bound to a [`ContractRunner`]: the connected signer, or a
//! read-only provider. Rebuild them whenever the session changes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use monsphere_shared::ContractAddresses;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::contracts::{
    ForumInfo, IChats, IForums, IFriendSystem, IUserRegistry, PostInfo, Profile, Relation,
    SessionRow, Vote,
};
use crate::error::{ContractError, ContractResult};
use crate::events::TransactionReceipt;
use crate::provider::{methods, request_as, Eip1193Provider};
use crate::session::Signer;

/// What contract handles run on.
#[derive(Clone)]
pub enum ContractRunner {
    /// Connected account: reads and writes.
    Signer(Signer),
    /// No account: reads only.
    ReadOnly(Arc<dyn Eip1193Provider>),
}

impl ContractRunner {
    /// The provider requests go to.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        match self {
            Self::Signer(signer) => signer.provider(),
            Self::ReadOnly(provider) => provider,
        }
    }

    /// The account transactions are sent from, if any.
    #[must_use]
    pub const fn sender(&self) -> Option<Address> {
        match self {
            Self::Signer(signer) => Some(signer.address()),
            Self::ReadOnly(_) => None,
        }
    }
}

impl fmt::Debug for ContractRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signer(signer) => f.debug_tuple("Signer").field(&signer.address()).finish(),
            Self::ReadOnly(_) => f.write_str("ReadOnly"),
        }
    }
}

/// A submitted transaction that has not been confirmed yet.
pub struct PendingTransaction {
    hash: B256,
    provider: Arc<dyn Eip1193Provider>,
    poll_interval: Duration,
}

impl PendingTransaction {
    /// Wraps an already-submitted transaction hash.
    #[must_use]
    pub fn new(hash: B256, provider: Arc<dyn Eip1193Provider>, poll_interval: Duration) -> Self {
        Self {
            hash,
            provider,
            poll_interval,
        }
    }

    /// Transaction hash.
    #[inline]
    #[must_use]
    pub const fn hash(&self) -> B256 {
        self.hash
    }

    /// Polls for the receipt until the transaction is mined.
    ///
    /// There is no timeout: a node that never returns a receipt keeps the
    /// caller waiting.
    ///
    /// # Errors
    ///
    /// [`ContractError::Reverted`] if the receipt reports failure, or any
    /// provider error while polling.
    pub async fn wait(self) -> ContractResult<TransactionReceipt> {
        loop {
            let receipt: Option<TransactionReceipt> = decode(
                methods::GET_RECEIPT,
                request_as(self.provider.as_ref(), methods::GET_RECEIPT, json!([self.hash])).await?,
            )?;

            if let Some(receipt) = receipt {
                if !receipt.succeeded() {
                    tracing::warn!(hash = %self.hash, "transaction reverted");
                    return Err(ContractError::Reverted { tx_hash: self.hash });
                }
                tracing::debug!(hash = %self.hash, block = ?receipt.block_number, "transaction mined");
                return Ok(receipt);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTransaction").field("hash", &self.hash).finish_non_exhaustive()
    }
}

fn decode<T>(method: &str, result: Result<T, String>) -> ContractResult<T> {
    result.map_err(|detail| ContractError::InvalidResponse {
        method: method.to_string(),
        detail,
    })
}

/// One deployed contract bound to a runner.
#[derive(Clone, Debug)]
struct ContractHandle {
    address: Address,
    runner: ContractRunner,
    receipt_interval: Duration,
}

impl ContractHandle {
    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> ContractResult<T> {
        decode(method, request_as(self.runner.provider().as_ref(), method, params).await?)
    }

    async fn call<C: SolCall>(&self, call: &C) -> ContractResult<C::Return> {
        let data = Bytes::from(call.abi_encode());
        let output: Bytes = self
            .request(methods::CALL, json!([{ "to": self.address, "data": data }, "latest"]))
            .await?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    async fn send<C: SolCall>(&self, call: &C) -> ContractResult<PendingTransaction> {
        let from = self.runner.sender().ok_or(ContractError::ReadOnly)?;
        let data = Bytes::from(call.abi_encode());
        let hash: B256 = self
            .request(
                methods::SEND_TRANSACTION,
                json!([{ "from": from, "to": self.address, "data": data }]),
            )
            .await?;

        tracing::info!(%hash, to = %self.address, "transaction submitted");
        Ok(PendingTransaction::new(
            hash,
            Arc::clone(self.runner.provider()),
            self.receipt_interval,
        ))
    }

    async fn deployed(&self) -> ContractResult<bool> {
        let code: Bytes = self
            .request(methods::GET_CODE, json!([self.address, "latest"]))
            .await?;
        Ok(!code.is_empty())
    }
}

/// UserRegistry handle.
#[derive(Clone, Debug)]
pub struct UserRegistry(ContractHandle);

impl UserRegistry {
    /// Contract address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0.address
    }

    /// Returns false if no code is deployed at the address on this chain.
    ///
    /// # Errors
    ///
    /// Provider failures.
    pub async fn is_deployed(&self) -> ContractResult<bool> {
        self.0.deployed().await
    }

    /// Registers `username` with a messaging public key (may be empty).
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn register(&self, username: &str, pub_key: &str) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IUserRegistry::registerCall {
                username: username.to_string(),
                pubKey: pub_key.to_string(),
            })
            .await
    }

    /// Returns true if `user` has registered.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn is_registered(&self, user: Address) -> ContractResult<bool> {
        Ok(self
            .0
            .call(&IUserRegistry::isRegisteredCall { user })
            .await?
            .registered)
    }

    /// Loads `user`'s profile.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn get_profile(&self, user: Address) -> ContractResult<Profile> {
        let profile = self.0.call(&IUserRegistry::getProfileCall { user }).await?;
        Ok(Profile {
            username: profile.username,
            pub_key: profile.pubKey,
        })
    }

    /// Resolves a username. Unknown names resolve to the zero address.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn address_of_username(&self, username: &str) -> ContractResult<Address> {
        Ok(self
            .0
            .call(&IUserRegistry::addressOfUsernameCall {
                username: username.to_string(),
            })
            .await?
            .user)
    }

    /// Deletes the caller's account.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn delete_account(&self) -> ContractResult<PendingTransaction> {
        self.0.send(&IUserRegistry::deleteAccountCall {}).await
    }
}

/// FriendSystem handle.
#[derive(Clone, Debug)]
pub struct FriendSystem(ContractHandle);

impl FriendSystem {
    /// Contract address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0.address
    }

    /// Relation between `me` and `other`, as seen from `me`.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn get_relation(&self, me: Address, other: Address) -> ContractResult<Relation> {
        let status = self
            .0
            .call(&IFriendSystem::getRelationCall { me, other })
            .await?
            .status;
        Ok(Relation::from_u8(status))
    }

    /// Sends a friend request to `to`.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn send_friend_request(&self, to: Address) -> ContractResult<PendingTransaction> {
        self.0.send(&IFriendSystem::sendFriendRequestCall { to }).await
    }

    /// Accepts `from`'s request.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn accept_friend_request(&self, from: Address) -> ContractResult<PendingTransaction> {
        self.0.send(&IFriendSystem::acceptFriendRequestCall { from }).await
    }

    /// Declines `from`'s request.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn decline_friend_request(&self, from: Address) -> ContractResult<PendingTransaction> {
        self.0.send(&IFriendSystem::declineFriendRequestCall { from }).await
    }

    /// Removes `friend`.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn remove_friend(&self, friend: Address) -> ContractResult<PendingTransaction> {
        self.0.send(&IFriendSystem::removeFriendCall { friend }).await
    }
}

/// Chats handle.
#[derive(Clone, Debug)]
pub struct Chats(ContractHandle);

impl Chats {
    /// Contract address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0.address
    }

    /// Opens a session with `peer`.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn create_session(&self, peer: Address) -> ContractResult<PendingTransaction> {
        self.0.send(&IChats::createSessionCall { peer }).await
    }

    /// Ids of every session `user` takes part in.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn get_my_sessions(&self, user: Address) -> ContractResult<Vec<U256>> {
        Ok(self.0.call(&IChats::getMySessionsCall { user }).await?.ids)
    }

    /// One session row.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn session(&self, id: U256) -> ContractResult<SessionRow> {
        let data = self.0.call(&IChats::sessionsCall { id }).await?;
        Ok(SessionRow::from_chain_data(id, data))
    }

    /// Content id of the session's latest message.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn get_last_cid(&self, id: U256) -> ContractResult<String> {
        Ok(self.0.call(&IChats::getLastCidCall { id }).await?.cid)
    }

    /// Posts a message to a session.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn send_message(&self, id: U256, cid: &str) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IChats::sendMessageCall {
                id,
                cid: cid.to_string(),
            })
            .await
    }

    /// Closes a session.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn end_session(&self, id: U256) -> ContractResult<PendingTransaction> {
        self.0.send(&IChats::endSessionCall { id }).await
    }

    /// Creates a group with initial members.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn create_group(
        &self,
        name: &str,
        members: Vec<Address>,
    ) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IChats::createGroupCall {
                name: name.to_string(),
                members,
            })
            .await
    }

    /// Adds a member to a group.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn add_member(&self, group_id: U256, member: Address) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IChats::addMemberCall {
                groupId: group_id,
                member,
            })
            .await
    }

    /// Removes a member from a group.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn remove_member(
        &self,
        group_id: U256,
        member: Address,
    ) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IChats::removeMemberCall {
                groupId: group_id,
                member,
            })
            .await
    }

    /// Posts a message to a group.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn send_group_message(
        &self,
        group_id: U256,
        cid: &str,
    ) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IChats::sendGroupMessageCall {
                groupId: group_id,
                cid: cid.to_string(),
            })
            .await
    }
}

/// Forums handle.
#[derive(Clone, Debug)]
pub struct Forums(ContractHandle);

impl Forums {
    /// Contract address. `ForumCreated` logs are matched against it.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0.address
    }

    /// Creates a forum. The new id is in the receipt's `ForumCreated` log.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn create_forum(&self, title: &str) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IForums::createForumCall {
                title: title.to_string(),
            })
            .await
    }

    /// Forum header.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn forum(&self, id: U256) -> ContractResult<ForumInfo> {
        let data = self.0.call(&IForums::forumsCall { id }).await?;
        Ok(ForumInfo::from_chain_data(id, data))
    }

    /// Ids of every post in a forum.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn get_posts_for_forum(&self, forum_id: U256) -> ContractResult<Vec<U256>> {
        Ok(self
            .0
            .call(&IForums::getPostsForForumCall { forumId: forum_id })
            .await?
            .ids)
    }

    /// One post.
    ///
    /// # Errors
    ///
    /// Provider or decode failures.
    pub async fn post(&self, id: U256) -> ContractResult<PostInfo> {
        let data = self.0.call(&IForums::postsCall { id }).await?;
        Ok(PostInfo::from_chain_data(id, data))
    }

    /// Adds a post to a forum.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn create_post(&self, forum_id: U256, cid: &str) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IForums::createPostCall {
                forumId: forum_id,
                cid: cid.to_string(),
            })
            .await
    }

    /// Votes on a post.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn vote_post(&self, post_id: U256, vote: Vote) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IForums::votePostCall {
                postId: post_id,
                value: vote.value(),
            })
            .await
    }

    /// Comments on a post.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn create_comment(&self, post_id: U256, cid: &str) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IForums::createCommentCall {
                postId: post_id,
                cid: cid.to_string(),
            })
            .await
    }

    /// Deletes a forum.
    ///
    /// # Errors
    ///
    /// [`ContractError::ReadOnly`] without a signer, or provider failures.
    pub async fn delete_forum(&self, forum_id: U256) -> ContractResult<PendingTransaction> {
        self.0
            .send(&IForums::deleteForumCall { forumId: forum_id })
            .await
    }
}

/// Handles to all four contracts, bound to one runner.
#[derive(Clone, Debug)]
pub struct Contracts {
    /// UserRegistry.
    pub user_registry: UserRegistry,
    /// FriendSystem.
    pub friend_system: FriendSystem,
    /// Chats.
    pub chats: Chats,
    /// Forums.
    pub forums: Forums,
}

impl Contracts {
    /// Binds the four contracts to `runner`.
    ///
    /// # Arguments
    ///
    /// * `runner` - Signer or read-only provider
    /// * `addresses` - Deployed contract addresses
    /// * `receipt_interval` - Receipt polling period for writes
    #[must_use]
    pub fn new(runner: &ContractRunner, addresses: &ContractAddresses, receipt_interval: Duration) -> Self {
        let handle = |address| ContractHandle {
            address,
            runner: runner.clone(),
            receipt_interval,
        };

        Self {
            user_registry: UserRegistry(handle(addresses.user_registry)),
            friend_system: FriendSystem(handle(addresses.friend_system)),
            chats: Chats(handle(addresses.chats)),
            forums: Forums(handle(addresses.forums)),
        }
    }

    /// The runner every handle shares.
    #[must_use]
    pub const fn runner(&self) -> &ContractRunner {
        &self.user_registry.0.runner
    }

    /// Returns true if the handles can send transactions.
    #[must_use]
    pub const fn can_write(&self) -> bool {
        self.runner().sender().is_some()
    }
}
