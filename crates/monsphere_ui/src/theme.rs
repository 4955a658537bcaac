//! Light/dark theming.
//!
//! A stored preference always wins over the system preference. Toggling
//! flips the mode, applies it and persists `"dark"` or `"light"` under
//! [`THEME_KEY`].

use std::fmt;
use std::sync::Arc;

use monsphere_shared::THEME_KEY;
use parking_lot::RwLock;

use crate::store::{KeyValueStore, StoreError};

/// Light or dark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThemeMode {
    /// Light mode.
    #[default]
    Light,
    /// Dark mode.
    Dark,
}

impl ThemeMode {
    /// Stored form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Reads a stored value. Anything but `"dark"` is light.
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        if value == "dark" {
            Self::Dark
        } else {
            Self::Light
        }
    }

    /// The other mode.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the applied theme and its persisted preference.
pub struct ThemeController {
    store: Arc<dyn KeyValueStore>,
    applied: RwLock<ThemeMode>,
}

impl ThemeController {
    /// Creates a controller in light mode. Call [`ThemeController::init`] next.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            applied: RwLock::new(ThemeMode::Light),
        }
    }

    /// Picks the stored preference, else the system one, and applies it.
    ///
    /// A store that cannot be read counts as "no preference".
    pub fn init(&self, system_prefers_dark: bool) -> ThemeMode {
        let stored = match self.store.get(THEME_KEY) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(%err, "theme preference unreadable");
                None
            }
        };
        let mode = match stored {
            Some(value) => ThemeMode::from_stored(&value),
            None if system_prefers_dark => ThemeMode::Dark,
            None => ThemeMode::Light,
        };
        self.apply(mode);
        mode
    }

    /// Currently applied mode.
    #[must_use]
    pub fn mode(&self) -> ThemeMode {
        *self.applied.read()
    }

    /// Flips, applies and persists the mode.
    ///
    /// # Errors
    ///
    /// The new mode is applied even if persisting it fails.
    pub fn toggle(&self) -> Result<ThemeMode, StoreError> {
        let next = self.mode().flipped();
        self.apply(next);
        self.store.set(THEME_KEY, next.as_str())?;
        Ok(next)
    }

    fn apply(&self, mode: ThemeMode) {
        *self.applied.write() = mode;
        tracing::debug!(%mode, "theme applied");
    }
}
