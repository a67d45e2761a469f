//! Ordered message log for the active room.

use partyline_proto::ChatMessage;

/// Append/reset buffer of chat messages, scoped to one session.
///
/// Messages are kept in arrival order. The log never reorders and never
/// deduplicates — if the backend delivers a duplicate, it is displayed
/// twice. On every successful join or rejoin the log is replaced wholesale
/// with the server-supplied history; it is never merged with messages
/// buffered before a disconnect.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, preserving arrival order.
    pub fn append(&mut self, message: ChatMessage) {
        self.entries.push(message);
    }

    /// Replace the entire log with a server-supplied history.
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.entries = messages;
    }

    /// Drop all messages.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Messages in arrival order.
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// Number of messages held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the log holds no messages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
