//! # Forum Detail
//!
//! One forum: header, posts newest first, voting and comments.
//!
//! ```text
//!   load ──▶ forums(id) ──▶ getPostsForForum(id) ──▶ posts(pid) × n
//! ```
//!
//! The header and the post list are read independently, so one failing
//! leaves the other. Posts and votes re-read only the posts once the receipt
//! is in.
//! Comments only clear their draft: the contract exposes no comment list.

use std::collections::HashMap;
use std::fmt::Write as _;

use monsphere_chain::contracts::sort_posts_newest_first;
use monsphere_chain::{ContractError, ForumInfo, PostInfo, Vote, U256};
use parking_lot::Mutex;

use super::{format_ts, parse_id, short, submit, ViewContext};

/// Forum detail state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForumDetailState {
    /// Forum header, once loaded.
    pub info: Option<ForumInfo>,
    /// Posts, newest first.
    pub posts: Vec<PostInfo>,
    /// True until the first load finishes.
    pub loading: bool,
    /// New post input.
    pub new_post: String,
    /// Comment draft per post.
    pub comment_drafts: HashMap<U256, String>,
    /// A write is in flight.
    pub submitting: bool,
}

impl Default for ForumDetailState {
    fn default() -> Self {
        Self {
            info: None,
            posts: Vec::new(),
            loading: true,
            new_post: String::new(),
            comment_drafts: HashMap::new(),
            submitting: false,
        }
    }
}

/// Forum detail view for the `/forums/:id` route.
pub struct ForumDetailView {
    ctx: ViewContext,
    raw_id: String,
    forum_id: Option<U256>,
    state: Mutex<ForumDetailState>,
}

impl ForumDetailView {
    /// Creates the view for the id segment of the route.
    ///
    /// An id that is not a decimal number never loads.
    #[must_use]
    pub fn new(ctx: ViewContext, raw_id: &str) -> Self {
        Self {
            ctx,
            raw_id: raw_id.to_string(),
            forum_id: parse_id(raw_id),
            state: Mutex::new(ForumDetailState::default()),
        }
    }

    /// Parsed forum id.
    #[must_use]
    pub const fn forum_id(&self) -> Option<U256> {
        self.forum_id
    }

    /// Snapshot of the state.
    #[must_use]
    pub fn state(&self) -> ForumDetailState {
        self.state.lock().clone()
    }

    /// Header title, or `#<id>` until the header is known.
    #[must_use]
    pub fn title(&self) -> String {
        let state = self.state.lock();
        match &state.info {
            Some(info) if !info.title.is_empty() => info.title.clone(),
            _ => format!("#{}", self.raw_id),
        }
    }

    /// Reads the header and every post. Each read fails on its own.
    pub async fn load(&self) {
        self.load_header().await;
        self.load_posts().await;
        self.state.lock().loading = false;
    }

    /// Reads the forum header.
    pub async fn load_header(&self) {
        let (Some(id), Some(contracts)) = (self.forum_id, self.ctx.contracts()) else {
            return;
        };
        match contracts.forums.forum(id).await {
            Ok(info) => self.state.lock().info = Some(info),
            Err(err) => tracing::error!(forum_id = %id, %err, "loading forum header failed"),
        }
    }

    /// Reads the post ids, then each post.
    pub async fn load_posts(&self) {
        let (Some(id), Some(contracts)) = (self.forum_id, self.ctx.contracts()) else {
            return;
        };

        let result = async {
            let ids = contracts.forums.get_posts_for_forum(id).await?;
            let mut posts = Vec::with_capacity(ids.len());
            for post_id in ids {
                posts.push(contracts.forums.post(post_id).await?);
            }
            Ok::<_, ContractError>(posts)
        }
        .await;

        match result {
            Ok(mut posts) => {
                sort_posts_newest_first(&mut posts);
                self.state.lock().posts = posts;
            }
            Err(err) => tracing::error!(forum_id = %id, %err, "loading posts failed"),
        }
    }

    /// Sets the new post input.
    pub fn set_new_post(&self, value: &str) {
        self.state.lock().new_post = value.to_string();
    }

    /// Sets the comment draft of one post.
    pub fn set_comment_draft(&self, post_id: U256, value: &str) {
        self.state.lock().comment_drafts.insert(post_id, value.to_string());
    }

    /// Publishes the new post input.
    pub async fn create_post(&self) {
        let Some(forum_id) = self.forum_id else {
            return;
        };
        let text = self.state.lock().new_post.trim().to_string();
        if text.is_empty() {
            return;
        }
        if self
            .write("Failed to create post", |contracts| async move {
                contracts.forums.create_post(forum_id, &text).await
            })
            .await
        {
            self.state.lock().new_post.clear();
            self.load_posts().await;
        }
    }

    /// Votes on a post.
    pub async fn vote(&self, post_id: U256, vote: Vote) {
        if self
            .write("Failed to vote", |contracts| async move {
                contracts.forums.vote_post(post_id, vote).await
            })
            .await
        {
            self.load_posts().await;
        }
    }

    /// Publishes one post's comment draft. Other drafts stay.
    pub async fn create_comment(&self, post_id: U256) {
        let text = self
            .state
            .lock()
            .comment_drafts
            .get(&post_id)
            .map(|draft| draft.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return;
        }
        if self
            .write("Failed to comment", |contracts| async move {
                contracts.forums.create_comment(post_id, &text).await
            })
            .await
        {
            self.state.lock().comment_drafts.remove(&post_id);
        }
    }

    /// Deletes the forum after confirmation and returns to the index.
    pub async fn delete_forum(&self) {
        let Some(forum_id) = self.forum_id else {
            return;
        };
        if !self.ctx.notifier.confirm("Delete this forum?") {
            return;
        }
        if self
            .write("Failed to delete forum", |contracts| async move {
                contracts.forums.delete_forum(forum_id).await
            })
            .await
        {
            self.ctx.navigator.navigate("/forums");
        }
    }

    /// Text rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let title = self.title();
        let state = self.state();
        let mut out = format!("Forum {title}\n");
        if let Some(info) = &state.info {
            let _ = writeln!(
                out,
                "by {} on {}",
                short(info.creator),
                format_ts(info.created_at)
            );
        }
        if state.loading {
            out.push_str("Loading…\n");
            return out;
        }
        out.push('\n');
        if state.posts.is_empty() {
            out.push_str("No posts yet\n");
        }
        for post in &state.posts {
            let _ = writeln!(
                out,
                "[{:>4}] #{} {} ({})",
                post.score.to_string(),
                post.id,
                short(post.author),
                format_ts(post.ts)
            );
            let _ = writeln!(out, "       {}", post.cid);
        }
        out
    }

    async fn write<F, Fut>(&self, fallback: &str, write: F) -> bool
    where
        F: FnOnce(monsphere_chain::Contracts) -> Fut,
        Fut: std::future::Future<
            Output = Result<monsphere_chain::PendingTransaction, ContractError>,
        >,
    {
        {
            let mut state = self.state.lock();
            if state.submitting {
                return false;
            }
            state.submitting = true;
        }
        let receipt = submit(&self.ctx, fallback, write).await;
        self.state.lock().submitting = false;
        receipt.is_some()
    }
}
