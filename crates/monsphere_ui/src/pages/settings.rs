//! Settings: theme, disconnect and account deletion.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{short, submit, ViewContext};
use crate::theme::{ThemeController, ThemeMode};

/// Settings view.
pub struct SettingsView {
    ctx: ViewContext,
    theme: Arc<ThemeController>,
    deleting: Mutex<bool>,
}

impl SettingsView {
    /// Creates the view over the application's theme controller.
    #[must_use]
    pub fn new(ctx: ViewContext, theme: Arc<ThemeController>) -> Self {
        Self {
            ctx,
            theme,
            deleting: Mutex::new(false),
        }
    }

    /// Applied theme.
    #[must_use]
    pub fn theme(&self) -> ThemeMode {
        self.theme.mode()
    }

    /// Flips and persists the theme.
    ///
    /// A preference that cannot be saved is logged; the new theme still
    /// applies for this run.
    pub fn toggle_theme(&self) -> ThemeMode {
        match self.theme.toggle() {
            Ok(mode) => mode,
            Err(err) => {
                tracing::warn!(%err, "theme preference not saved");
                self.theme.mode()
            }
        }
    }

    /// Forgets the wallet connection.
    pub fn disconnect(&self) {
        self.ctx.session.disconnect();
    }

    /// A deletion is in flight.
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        *self.deleting.lock()
    }

    /// Deletes the connected account after confirmation.
    pub async fn delete_account(&self) {
        if self.is_deleting() || !self.ctx.session.is_connected() {
            return;
        }
        if !self
            .ctx
            .notifier
            .confirm("Permanently delete your account? This cannot be undone.")
        {
            return;
        }

        *self.deleting.lock() = true;
        let receipt = submit(&self.ctx, "Failed to delete account", |contracts| async move {
            contracts.user_registry.delete_account().await
        })
        .await;
        *self.deleting.lock() = false;

        if receipt.is_some() {
            tracing::info!("account deleted");
            self.ctx.notifier.alert("Account deleted.");
        }
    }

    /// Text rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("Settings\n");
        out.push_str(&format!("Theme: {}\n", self.theme()));
        match self.ctx.address() {
            Some(address) => {
                out.push_str(&format!("Account: {}\n", short(address)));
                out.push_str(if self.is_deleting() {
                    "Deleting account…\n"
                } else {
                    "[Disconnect] [Delete Account]\n"
                });
            }
            None => out.push_str("Not connected\n"),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notices::Notice;
    use crate::pages::fixtures::{self, addresses};
    use crate::store::{KeyValueStore, MemoryStore};
    use monsphere_chain::contracts::IUserRegistry;
    use monsphere_shared::THEME_KEY;

    fn theme() -> (Arc<MemoryStore>, Arc<ThemeController>) {
        let store = Arc::new(MemoryStore::new());
        let controller = Arc::new(ThemeController::new(store.clone()));
        controller.init(false);
        (store, controller)
    }

    #[tokio::test]
    async fn test_toggle_theme_persists() {
        let harness = fixtures::idle();
        let (store, controller) = theme();
        let view = SettingsView::new(harness.ctx.clone(), controller);

        assert_eq!(view.toggle_theme(), ThemeMode::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(view.toggle_theme(), ThemeMode::Light);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn test_disconnect() {
        let harness = fixtures::connected().await;
        let view = SettingsView::new(harness.ctx.clone(), theme().1);

        view.disconnect();

        assert!(!harness.ctx.session.is_connected());
        assert!(view.render().contains("Not connected"));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let harness = fixtures::connected().await;
        let view = SettingsView::new(harness.ctx.clone(), theme().1);

        harness.notifier.answer_next(false);
        view.delete_account().await;
        assert_eq!(harness.wallet.transaction_count(), 0);

        view.delete_account().await;

        assert_eq!(
            harness
                .wallet
                .sent::<IUserRegistry::deleteAccountCall>(addresses().user_registry)
                .len(),
            1
        );
        let notices = harness.notifier.drain();
        assert_eq!(notices.last(), Some(&Notice::Alert("Account deleted.".into())));
        assert!(!view.is_deleting());
    }
}
