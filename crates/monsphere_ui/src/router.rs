//! Routing surface: seven pages plus a catch-all back to Home.

use std::fmt;

use parking_lot::RwLock;

/// A navigable page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`
    Home,
    /// `/chats`
    Chats,
    /// `/forums`
    Forums,
    /// `/forums/:id`. The id is kept as typed; the page validates it.
    ForumDetail(String),
    /// `/friends`
    Friends,
    /// `/history`
    History,
    /// `/settings`
    Settings,
}

impl Route {
    /// Resolves a path. Unknown paths redirect to [`Route::Home`].
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Self::Home,
            "/chats" => Self::Chats,
            "/forums" => Self::Forums,
            "/friends" => Self::Friends,
            "/history" => Self::History,
            "/settings" => Self::Settings,
            other => match other.strip_prefix("/forums/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Self::ForumDetail(id.to_string()),
                _ => Self::Home,
            },
        }
    }

    /// Canonical path.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Chats => "/chats".to_string(),
            Self::Forums => "/forums".to_string(),
            Self::ForumDetail(id) => format!("/forums/{id}"),
            Self::Friends => "/friends".to_string(),
            Self::History => "/history".to_string(),
            Self::Settings => "/settings".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// One entry of the navigation sidebar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavItem {
    /// Display label.
    pub label: &'static str,
    /// Target path.
    pub path: &'static str,
    /// Icon shown next to the label.
    pub icon: &'static str,
}

/// Navigation items, in display order.
pub const NAV_ITEMS: [NavItem; 6] = [
    NavItem { label: "Home", path: "/", icon: "🏠" },
    NavItem { label: "Chats", path: "/chats", icon: "💬" },
    NavItem { label: "Forums", path: "/forums", icon: "🧵" },
    NavItem { label: "Friends", path: "/friends", icon: "👥" },
    NavItem { label: "History", path: "/history", icon: "📜" },
    NavItem { label: "Settings", path: "/settings", icon: "⚙️" },
];

impl NavItem {
    /// Highlighted only on an exact path match, so `/forums/3` lights up nothing.
    #[must_use]
    pub fn is_active(&self, current_path: &str) -> bool {
        self.path == current_path
    }
}

/// Current location plus the trail that led there.
#[derive(Debug)]
pub struct Navigator {
    current: RwLock<Route>,
    history: RwLock<Vec<Route>>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

impl Navigator {
    /// Starts at `route`.
    #[must_use]
    pub fn new(route: Route) -> Self {
        Self {
            current: RwLock::new(route),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Where we are.
    #[must_use]
    pub fn current(&self) -> Route {
        self.current.read().clone()
    }

    /// Canonical path of where we are.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.current.read().path()
    }

    /// Goes to `path` (resolved through [`Route::parse`]).
    pub fn navigate(&self, path: &str) -> Route {
        let route = Route::parse(path);
        let previous = std::mem::replace(&mut *self.current.write(), route.clone());
        tracing::debug!(from = %previous, to = %route, "navigate");
        self.history.write().push(previous);
        route
    }

    /// Goes back one step. Returns false at the start of the trail.
    pub fn back(&self) -> bool {
        match self.history.write().pop() {
            Some(route) => {
                *self.current.write() = route;
                true
            }
            None => false,
        }
    }

    /// Navigation items with the active flag for the current location.
    #[must_use]
    pub fn nav_items(&self) -> Vec<(NavItem, bool)> {
        let path = self.current_path();
        NAV_ITEMS.iter().map(|item| (*item, item.is_active(&path))).collect()
    }
}
