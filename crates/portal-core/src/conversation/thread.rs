//! Session-scoped conversation thread.

use super::message::ConversationMessage;
use serde::{Deserialize, Serialize};

/// The message log and remote thread handle for one session.
///
/// `thread_id` moves from `None` to `Some` at most once and is never replaced
/// afterwards. `messages` is append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationThread {
    thread_id: Option<String>,
    messages: Vec<ConversationMessage>,
}

impl ConversationThread {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Adopts `thread_id` if no thread is held yet.
    ///
    /// Returns `true` when the id was adopted. Empty ids are ignored.
    pub fn adopt_thread_id(&mut self, thread_id: &str) -> bool {
        if self.thread_id.is_some() || thread_id.is_empty() {
            return false;
        }
        self.thread_id = Some(thread_id.to_string());
        true
    }

    pub fn push(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }
}
