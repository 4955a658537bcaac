//! # Commands
//!
//! Each command drives one page view's read path and returns its text
//! rendering.
//!
//! | Command              | View        | Reads                                  |
//! |----------------------|-------------|----------------------------------------|
//! | `forum <id>`         | ForumDetail | forums, getPostsForForum, posts        |
//! | `sessions <address>` | History     | getMySessions, sessions                |
//! | `profile <address>`  | Home        | eth_getCode, isRegistered, getProfile  |
//! | `whois <username>`   | Friends     | addressOfUsername, getRelation         |
//! | `theme [show/toggle]`| Settings    | preference file only                   |
//! | `routes`             | Header      | none                                   |

use std::fmt::Write as _;

use clap::{Subcommand, ValueEnum};
use monsphere_chain::Address;
use monsphere_ui::{ForumDetailView, FriendsView, HistoryView, HomeView, NAV_ITEMS};

use crate::app::App;
use crate::error::{AppError, AppResult};

/// What to do with the theme preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    /// Print the stored preference.
    #[default]
    Show,
    /// Flip and save it.
    Toggle,
}

/// Command-line subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show a forum and its posts.
    Forum {
        /// Forum id (decimal).
        id: String,
    },
    /// List an account's chat sessions.
    Sessions {
        /// Account address.
        address: String,
    },
    /// Show an account's registration.
    Profile {
        /// Account address.
        address: String,
    },
    /// Look up a username.
    Whois {
        /// Username to find.
        username: String,
        /// Read the friend relation from this account's side.
        #[arg(long)]
        me: Option<String>,
    },
    /// Show or toggle the theme preference.
    Theme {
        /// Action.
        #[arg(value_enum, default_value_t = ThemeAction::Show)]
        action: ThemeAction,
    },
    /// Print the navigation surface.
    Routes,
}

impl Command {
    /// Returns true if the command reads the chain.
    #[must_use]
    pub const fn needs_chain(&self) -> bool {
        !matches!(self, Self::Theme { .. } | Self::Routes)
    }
}

fn parse_address(what: &'static str, input: &str) -> AppResult<Address> {
    input.trim().parse().map_err(|_| AppError::invalid(what, input))
}

/// Runs one command against a started app.
///
/// # Errors
///
/// [`AppError::NoProvider`] when a chain command has nothing to read from,
/// [`AppError::InvalidInput`] for malformed arguments, and
/// [`AppError::Store`] when the theme preference cannot be saved.
pub async fn execute(app: &App, command: Command) -> AppResult<String> {
    if command.needs_chain() && app.session().runner().is_none() {
        return Err(AppError::NoProvider);
    }
    let ctx = app.context();

    match command {
        Command::Forum { id } => {
            let view = ForumDetailView::new(ctx, &id);
            if view.forum_id().is_none() {
                return Err(AppError::invalid("forum id", id));
            }
            view.load().await;
            Ok(view.render())
        }
        Command::Sessions { address } => {
            let user = parse_address("address", &address)?;
            let view = HistoryView::new(ctx);
            view.load_for(user).await;
            Ok(view.render_for(user))
        }
        Command::Profile { address } => {
            let user = parse_address("address", &address)?;
            let view = HomeView::new(ctx);
            view.load_for(user).await;
            Ok(view.render_for(user))
        }
        Command::Whois { username, me } => {
            let me = me.map(|me| parse_address("address", &me)).transpose()?;
            let view = FriendsView::new(ctx);
            view.set_username(&username);
            view.lookup_for(me.or_else(|| app.session().address())).await;
            Ok(view.render())
        }
        Command::Theme { action } => {
            let mode = match action {
                ThemeAction::Show => app.theme().mode(),
                ThemeAction::Toggle => app.theme().toggle()?,
            };
            Ok(format!("theme: {mode}\n"))
        }
        Command::Routes => {
            let mut out = String::new();
            for item in NAV_ITEMS {
                let _ = writeln!(out, "{:<10} {}", item.label, item.path);
            }
            out.push_str("Forum      /forums/:id\n");
            out.push_str("*          redirects to /\n");
            Ok(out)
        }
    }
}
