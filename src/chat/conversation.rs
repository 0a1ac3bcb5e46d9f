//! Conversation view model: the ordered message log and pending indicator.

use super::ids::RequestId;
use super::message::Message;

/// Append-only log of the current session's messages.
///
/// Messages are never reordered or removed one by one; the log is only
/// cleared or replaced as a whole. [`Self::generation`] changes whenever
/// that happens so views know to redraw from scratch.
#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
    pending: Option<RequestId>,
    generation: u64,
}

impl ConversationLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Bumped on every clear or replace.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop every message and the pending indicator.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending = None;
        self.generation += 1;
    }

    /// Replace the first `prefix` messages with `replacement`, keeping the rest.
    ///
    /// `prefix` is clamped to the log length.
    pub fn replace_prefix(&mut self, prefix: usize, replacement: Vec<Message>) {
        let prefix = prefix.min(self.messages.len());
        let tail = self.messages.split_off(prefix);
        self.messages = replacement;
        self.messages.extend(tail);
        self.generation += 1;
    }

    /// Show the pending indicator for `request`.
    pub fn show_pending(&mut self, request: RequestId) {
        self.pending = Some(request);
    }

    /// Remove the pending indicator.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Request the pending indicator stands for, if shown.
    #[must_use]
    pub const fn pending(&self) -> Option<RequestId> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut log = ConversationLog::new();
        log.push(Message::user("one"));
        log.push(Message::user("two"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[0].text(), "one");
        assert_eq!(log.messages()[1].text(), "two");
        assert_eq!(log.generation(), 0);
    }

    #[test]
    fn test_clear_drops_pending_and_bumps_generation() {
        let mut log = ConversationLog::new();
        log.push(Message::user("one"));
        log.show_pending(RequestId::new());

        log.clear();

        assert!(log.is_empty());
        assert!(log.pending().is_none());
        assert_eq!(log.generation(), 1);
    }

    #[test]
    fn test_replace_prefix_keeps_tail() {
        let mut log = ConversationLog::new();
        log.push(Message::user("welcome"));
        log.push(Message::user("live"));

        log.replace_prefix(1, vec![Message::user("h1"), Message::user("h2")]);

        let texts: Vec<&str> = log.messages().iter().map(Message::text).collect();
        assert_eq!(texts, vec!["h1", "h2", "live"]);
    }

    #[test]
    fn test_replace_prefix_clamps() {
        let mut log = ConversationLog::new();
        log.replace_prefix(3, vec![Message::user("h1")]);
        assert_eq!(log.len(), 1);
    }
}
