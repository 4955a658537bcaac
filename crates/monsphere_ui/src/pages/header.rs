//! Header and navigation chrome shown on every page.

use std::fmt::Write as _;

use monsphere_chain::Address;

use super::{connect_wallet, short, ViewContext};
use crate::router::NavItem;

/// Header view.
pub struct HeaderView {
    ctx: ViewContext,
}

impl HeaderView {
    /// Creates the header.
    #[must_use]
    pub const fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    /// Navigation items with their active flag.
    #[must_use]
    pub fn nav_items(&self) -> Vec<(NavItem, bool)> {
        self.ctx.navigator.nav_items()
    }

    /// Truncated address when connected.
    #[must_use]
    pub fn account_label(&self) -> Option<String> {
        self.ctx.address().map(short)
    }

    /// Connects the wallet from the header button.
    pub async fn connect(&self) -> Option<Address> {
        connect_wallet(&self.ctx).await
    }

    /// Text rendering: the brand, one line of navigation, then the account.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("MonSphere  ");
        for (item, active) in self.nav_items() {
            if active {
                let _ = write!(out, " [{}]", item.label);
            } else {
                let _ = write!(out, "  {} ", item.label);
            }
        }
        out.push_str("   ");
        match self.account_label() {
            Some(label) => out.push_str(&label),
            None => out.push_str("[Connect Wallet]"),
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notices::Notice;
    use crate::pages::fixtures::{self, me};
    use monsphere_chain::WalletSession;
    use monsphere_shared::{NetworkConfig, WalletConfig};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_active_item_follows_navigation() {
        let harness = fixtures::idle();
        let header = HeaderView::new(harness.ctx.clone());

        harness.ctx.navigator.navigate("/forums");

        let active: Vec<&str> = header
            .nav_items()
            .iter()
            .filter(|(_, active)| *active)
            .map(|(item, _)| item.label)
            .collect();
        assert_eq!(active, vec!["Forums"]);
        assert!(header.render().contains("[Forums]"));
    }

    #[tokio::test]
    async fn test_account_label() {
        let harness = fixtures::idle();
        let header = HeaderView::new(harness.ctx.clone());
        assert_eq!(header.account_label(), None);

        assert_eq!(header.connect().await, Some(me()));
        let label = header.account_label().unwrap();
        assert!(label.to_lowercase().starts_with("0xa1a1"));
        assert!(label.contains('…'));
    }

    #[tokio::test]
    async fn test_missing_wallet_opens_install_page() {
        let mut harness = fixtures::idle();
        harness.ctx.session = Arc::new(WalletSession::new(
            None,
            NetworkConfig::default(),
            &WalletConfig::default(),
        ));
        let header = HeaderView::new(harness.ctx.clone());

        assert_eq!(header.connect().await, None);

        let notices = harness.notifier.drain();
        assert_eq!(
            notices[0],
            Notice::Alert("Wallet not installed! Please install a wallet to continue.".into())
        );
        assert!(matches!(notices[1], Notice::OpenUrl(_)));
    }
}
