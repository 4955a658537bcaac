//! Forums index: open a forum by id or create one.

use parking_lot::Mutex;

use super::{submit, ViewContext};

/// Forums view state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForumsState {
    /// Forum id input.
    pub forum_id: String,
    /// New forum title input.
    pub title: String,
    /// Creation in flight.
    pub creating: bool,
}

/// Forums view.
pub struct ForumsView {
    ctx: ViewContext,
    state: Mutex<ForumsState>,
}

impl ForumsView {
    /// Creates the view.
    #[must_use]
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(ForumsState::default()),
        }
    }

    /// Snapshot of the state.
    #[must_use]
    pub fn state(&self) -> ForumsState {
        self.state.lock().clone()
    }

    /// Sets the forum id input.
    pub fn set_forum_id(&self, value: &str) {
        self.state.lock().forum_id = value.to_string();
    }

    /// Sets the title input.
    pub fn set_title(&self, value: &str) {
        self.state.lock().title = value.to_string();
    }

    /// Opens the forum whose id was typed in. Blank input does nothing.
    pub fn open_by_id(&self) {
        let id = self.state.lock().forum_id.trim().to_string();
        if !id.is_empty() {
            self.ctx.navigator.navigate(&format!("/forums/{id}"));
        }
    }

    /// Creates a forum and opens it.
    ///
    /// The new id is read from the `ForumCreated` log. Without one, the user
    /// is told to open the forum by id.
    pub async fn create_forum(&self) {
        let title = {
            let mut state = self.state.lock();
            let title = state.title.trim().to_string();
            if state.creating || title.is_empty() {
                return;
            }
            state.creating = true;
            title
        };

        let receipt = submit(&self.ctx, "Failed to create forum", |contracts| async move {
            contracts.forums.create_forum(&title).await
        })
        .await;
        self.state.lock().creating = false;

        let Some(receipt) = receipt else {
            return;
        };
        self.state.lock().title.clear();
        match receipt.forum_created(self.ctx.addresses.forums) {
            Some(created) => {
                tracing::info!(forum_id = %created.forum_id, "forum created");
                self.ctx
                    .navigator
                    .navigate(&format!("/forums/{}", created.forum_id));
            }
            None => self.ctx.notifier.alert("Forum created. Open it by ID."),
        }
    }

    /// Text rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let state = self.state();
        let mut out = String::from("Forums\n");
        out.push_str("Open forum by ID: ");
        out.push_str(if state.forum_id.is_empty() { "_" } else { &state.forum_id });
        out.push('\n');
        if state.creating {
            out.push_str("Creating forum…\n");
        } else if !self.ctx.session.is_connected() {
            out.push_str("Connect your wallet to create a forum.\n");
        }
        out
    }
}
