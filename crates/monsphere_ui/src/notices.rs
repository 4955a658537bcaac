//! User notices: blocking alerts, yes/no confirmations and external links.
//!
//! Views never talk to the screen directly. They hand notices to a
//! [`Notifier`]; the front end decides how to show them.

use std::collections::VecDeque;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

/// Something shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// A blocking message.
    Alert(String),
    /// A yes/no question and the answer it got.
    Confirm {
        /// Question text.
        question: String,
        /// Answer returned to the view.
        accepted: bool,
    },
    /// An external page to open.
    OpenUrl(String),
}

/// Shows notices to the user.
pub trait Notifier: Send + Sync {
    /// Shows a blocking message.
    fn alert(&self, message: &str);

    /// Asks a yes/no question.
    fn confirm(&self, question: &str) -> bool;

    /// Opens an external page.
    fn open_url(&self, url: &str);
}

/// Notifier that queues every notice on a channel.
///
/// Confirmations are answered from a scripted queue, falling back to a
/// default answer.
pub struct ChannelNotifier {
    sender: Sender<Notice>,
    receiver: Receiver<Notice>,
    answers: Mutex<VecDeque<bool>>,
    default_answer: bool,
}

impl ChannelNotifier {
    /// Creates a notifier that answers `default_answer` to every confirmation.
    #[must_use]
    pub fn new(default_answer: bool) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            answers: Mutex::new(VecDeque::new()),
            default_answer,
        }
    }

    /// Queues the answer for the next confirmation.
    pub fn answer_next(&self, accepted: bool) {
        self.answers.lock().push_back(accepted);
    }

    /// A receiver for the notice stream.
    #[must_use]
    pub fn receiver(&self) -> Receiver<Notice> {
        self.receiver.clone()
    }

    /// Takes every queued notice.
    #[must_use]
    pub fn drain(&self) -> Vec<Notice> {
        self.receiver.try_iter().collect()
    }

    /// Takes every queued alert text, dropping other notices.
    #[must_use]
    pub fn drain_alerts(&self) -> Vec<String> {
        self.drain()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Alert(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) {
        // The notifier holds a receiver, so the channel never disconnects.
        let _ = self.sender.send(notice);
    }
}

impl Notifier for ChannelNotifier {
    fn alert(&self, message: &str) {
        tracing::debug!(message, "alert");
        self.push(Notice::Alert(message.to_string()));
    }

    fn confirm(&self, question: &str) -> bool {
        let accepted = self.answers.lock().pop_front().unwrap_or(self.default_answer);
        self.push(Notice::Confirm {
            question: question.to_string(),
            accepted,
        });
        accepted
    }

    fn open_url(&self, url: &str) {
        self.push(Notice::OpenUrl(url.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_answers_then_default() {
        let notifier = ChannelNotifier::new(true);
        notifier.answer_next(false);

        assert!(!notifier.confirm("Delete?"));
        assert!(notifier.confirm("Delete?"));
        assert_eq!(notifier.drain().len(), 2);
    }

    #[test]
    fn test_drain_alerts() {
        let notifier = ChannelNotifier::new(false);
        notifier.alert("one");
        notifier.open_url("https://example.org");
        notifier.alert("two");

        assert_eq!(notifier.drain_alerts(), vec!["one", "two"]);
        assert!(notifier.drain().is_empty());
    }
}
