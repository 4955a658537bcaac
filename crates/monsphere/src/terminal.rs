//! Notices on a terminal.

use monsphere_ui::Notifier;

/// Prints notices to stderr. The command line never prompts, so every
/// confirmation is declined.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn confirm(&self, question: &str) -> bool {
        eprintln!("? {question} [no]");
        false
    }

    fn open_url(&self, url: &str) {
        eprintln!("-> {url}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmations_are_declined() {
        assert!(!TerminalNotifier.confirm("Delete this forum?"));
    }
}
