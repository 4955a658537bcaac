//! # Contract Definitions
//!
//! Solidity interfaces of the four MonSphere contracts and the Rust rows the
//! views display.

// The sol! macro generates code that we can't document, so allow missing_docs
#![allow(missing_docs)]

use std::cmp::Reverse;

use alloy_primitives::{Address, I256, U256};
use alloy_sol_types::sol;

sol! {
    /// Usernames and messaging public keys.
    #[derive(Debug)]
    interface IUserRegistry {
        function register(string username, string pubKey) external;
        function isRegistered(address user) external view returns (bool registered);
        function getProfile(address user) external view returns (string username, string pubKey);
        function addressOfUsername(string username) external view returns (address user);
        function deleteAccount() external;
    }
}

sol! {
    /// Friend requests. `getRelation` returns 0 none, 1 sent, 2 received, 3 friends.
    #[derive(Debug)]
    interface IFriendSystem {
        function getRelation(address me, address other) external view returns (uint8 status);
        function sendFriendRequest(address to) external;
        function acceptFriendRequest(address from) external;
        function declineFriendRequest(address from) external;
        function removeFriend(address friend) external;
    }
}

sol! {
    /// 1:1 chat sessions and groups. Messages are stored as content ids.
    #[derive(Debug)]
    interface IChats {
        function createSession(address peer) external returns (uint256 sessionId);
        function getMySessions(address user) external view returns (uint256[] ids);
        function sessions(uint256 id) external view returns (
            address a,
            address b,
            bool closed,
            string lastCid,
            uint256 createdAt
        );
        function getLastCid(uint256 id) external view returns (string cid);
        function sendMessage(uint256 id, string cid) external;
        function endSession(uint256 id) external;
        function createGroup(string name, address[] members) external returns (uint256 groupId);
        function addMember(uint256 groupId, address member) external;
        function removeMember(uint256 groupId, address member) external;
        function sendGroupMessage(uint256 groupId, string cid) external;
    }
}

sol! {
    /// Forums, posts, votes and comments.
    #[derive(Debug)]
    interface IForums {
        event ForumCreated(uint256 indexed forumId, address indexed creator, string title);

        function createForum(string title) external returns (uint256 forumId);
        function forums(uint256 id) external view returns (
            string title,
            address creator,
            uint256 createdAt
        );
        function getPostsForForum(uint256 forumId) external view returns (uint256[] ids);
        function posts(uint256 id) external view returns (
            uint256 forumId,
            address author,
            string cid,
            uint256 ts,
            int256 score
        );
        function createPost(uint256 forumId, string cid) external returns (uint256 postId);
        function votePost(uint256 postId, int8 value) external;
        function createComment(uint256 postId, string cid) external returns (uint256 commentId);
        function deleteForum(uint256 forumId) external;
    }
}

/// Converts an on-chain timestamp to seconds, saturating on absurd values.
#[inline]
#[must_use]
pub fn timestamp_u64(ts: U256) -> u64 {
    u64::try_from(ts).unwrap_or(u64::MAX)
}

/// A registered user's profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Profile {
    /// Unique username.
    pub username: String,
    /// Messaging public key (may be empty).
    pub pub_key: String,
}

/// Friend relation between the connected user and someone else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Relation {
    /// No relation.
    #[default]
    None,
    /// We sent them a request.
    RequestSent,
    /// They sent us a request.
    RequestReceived,
    /// Friends.
    Friends,
}

impl Relation {
    /// Decodes the contract's status code. Unknown codes read as [`Relation::None`].
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::RequestSent,
            2 => Self::RequestReceived,
            3 => Self::Friends,
            _ => Self::None,
        }
    }
}

/// Direction of a post vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vote {
    /// +1.
    Up,
    /// -1.
    Down,
}

impl Vote {
    /// The value sent to `votePost`.
    #[must_use]
    pub const fn value(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// A 1:1 chat session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRow {
    /// Session id.
    pub id: U256,
    /// First participant.
    pub a: Address,
    /// Second participant.
    pub b: Address,
    /// Closed sessions accept no messages.
    pub closed: bool,
    /// Content id of the latest message (empty if none).
    pub last_cid: String,
    /// Creation time (seconds).
    pub created_at: U256,
}

impl SessionRow {
    /// Builds a row from the `sessions(id)` getter.
    #[must_use]
    pub fn from_chain_data(id: U256, data: IChats::sessionsReturn) -> Self {
        Self {
            id,
            a: data.a,
            b: data.b,
            closed: data.closed,
            last_cid: data.lastCid,
            created_at: data.createdAt,
        }
    }

    /// The participant that is not `me`.
    #[must_use]
    pub fn peer_of(&self, me: Address) -> Address {
        if self.a == me {
            self.b
        } else {
            self.a
        }
    }
}

/// Forum header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForumInfo {
    /// Forum id.
    pub id: U256,
    /// Title.
    pub title: String,
    /// Creator.
    pub creator: Address,
    /// Creation time (seconds).
    pub created_at: U256,
}

impl ForumInfo {
    /// Builds a header from the `forums(id)` getter.
    #[must_use]
    pub fn from_chain_data(id: U256, data: IForums::forumsReturn) -> Self {
        Self {
            id,
            title: data.title,
            creator: data.creator,
            created_at: data.createdAt,
        }
    }
}

/// A forum post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostInfo {
    /// Post id.
    pub id: U256,
    /// Forum the post belongs to.
    pub forum_id: U256,
    /// Author.
    pub author: Address,
    /// Content id or inline text.
    pub cid: String,
    /// Post time (seconds).
    pub ts: U256,
    /// Net vote score.
    pub score: I256,
}

impl PostInfo {
    /// Builds a post from the `posts(id)` getter.
    #[must_use]
    pub fn from_chain_data(id: U256, data: IForums::postsReturn) -> Self {
        Self {
            id,
            forum_id: data.forumId,
            author: data.author,
            cid: data.cid,
            ts: data.ts,
            score: data.score,
        }
    }
}

/// Orders sessions newest first by `created_at`.
pub fn sort_sessions_newest_first(rows: &mut [SessionRow]) {
    rows.sort_by_key(|row| Reverse(row.created_at));
}

/// Orders posts newest first by `ts`.
pub fn sort_posts_newest_first(posts: &mut [PostInfo]) {
    posts.sort_by_key(|post| Reverse(post.ts));
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;

    fn session(id: u64, created_at: u64) -> SessionRow {
        SessionRow {
            id: U256::from(id),
            a: Address::repeat_byte(1),
            b: Address::repeat_byte(2),
            closed: false,
            last_cid: String::new(),
            created_at: U256::from(created_at),
        }
    }

    #[test]
    fn test_sessions_sort_newest_first() {
        let mut rows = vec![session(1, 100), session(2, 300), session(3, 200)];
        sort_sessions_newest_first(&mut rows);

        let order: Vec<U256> = rows.iter().map(|r| r.created_at).collect();
        assert_eq!(order, vec![U256::from(300), U256::from(200), U256::from(100)]);
    }

    #[test]
    fn test_peer_of() {
        let row = session(1, 0);
        assert_eq!(row.peer_of(Address::repeat_byte(1)), Address::repeat_byte(2));
        assert_eq!(row.peer_of(Address::repeat_byte(2)), Address::repeat_byte(1));
        // A stranger sees the first participant.
        assert_eq!(row.peer_of(Address::repeat_byte(9)), Address::repeat_byte(1));
    }

    #[test]
    fn test_relation_codes() {
        assert_eq!(Relation::from_u8(0), Relation::None);
        assert_eq!(Relation::from_u8(2), Relation::RequestReceived);
        assert_eq!(Relation::from_u8(3), Relation::Friends);
        assert_eq!(Relation::from_u8(42), Relation::None);
    }

    #[test]
    fn test_vote_values() {
        assert_eq!(Vote::Up.value(), 1);
        assert_eq!(Vote::Down.value(), -1);
    }

    #[test]
    fn test_session_getter_decodes() {
        let encoded = IChats::sessionsCall::abi_encode_returns(&(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            true,
            "bafy".to_string(),
            U256::from(1_700_000_000u64),
        ));
        let decoded = IChats::sessionsCall::abi_decode_returns(&encoded, true).unwrap();
        let row = SessionRow::from_chain_data(U256::from(7), decoded);

        assert_eq!(row.id, U256::from(7));
        assert!(row.closed);
        assert_eq!(row.last_cid, "bafy");
        assert_eq!(timestamp_u64(row.created_at), 1_700_000_000);
    }
}
