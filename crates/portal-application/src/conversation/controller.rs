//! Conversation controller: message log, thread continuity, remote calls.

use super::busy::BusyGuard;
use portal_core::config::DEFAULT_CHAT_TIMEOUT_SECS;
use portal_core::conversation::{
    AssistantGateway, AssistantReply, AssistantRequest, ConversationMessage, ConversationThread,
};
use portal_core::lead::LeadRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Assistant text appended whenever a remote call yields no usable reply.
pub const FALLBACK_REPLY: &str = "Sorry, there was an error processing your message.";

/// Upper bound on a single remote call unless configured otherwise.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(DEFAULT_CHAT_TIMEOUT_SECS);

/// Whether a remote call is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Sending,
}

/// Why a `send` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The input was empty after trimming.
    EmptyInput,
    /// Another `send` was still in flight.
    Busy,
}

/// Which branch a `send` took. The log itself carries the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant's reply was appended.
    Replied,
    /// The fallback text was appended in place of a reply.
    Fallback,
    /// Nothing was appended and no remote call was made.
    Skipped(SkipReason),
}

/// Owns the conversation for one resolved lead.
///
/// Every accepted `send` appends exactly two messages: the user's text, then
/// one assistant entry (the reply or [`FALLBACK_REPLY`]). Only one `send` may
/// be in flight; overlapping calls are skipped.
pub struct ConversationController {
    gateway: Arc<dyn AssistantGateway>,
    assistant_id: String,
    thread: Mutex<ConversationThread>,
    busy: AtomicBool,
    reply_timeout: Duration,
}

impl ConversationController {
    /// Creates a controller talking to the assistant configured for `lead`.
    pub fn new(lead: &LeadRecord, gateway: Arc<dyn AssistantGateway>) -> Self {
        Self {
            gateway,
            assistant_id: lead.assistant_id.clone(),
            thread: Mutex::new(ConversationThread::new()),
            busy: AtomicBool::new(false),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Sets the upper bound on a single remote call.
    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn state(&self) -> ControllerState {
        if self.busy.load(Ordering::Acquire) {
            ControllerState::Sending
        } else {
            ControllerState::Idle
        }
    }

    /// Whether `send(user_text)` would be accepted right now.
    ///
    /// A later `send` can still be skipped if another one starts in between.
    pub fn can_send(&self, user_text: &str) -> bool {
        !user_text.trim().is_empty() && self.state() == ControllerState::Idle
    }

    /// Snapshot of the message log.
    pub fn messages(&self) -> Vec<ConversationMessage> {
        lock_thread(&self.thread).messages().to_vec()
    }

    /// The thread id adopted from the remote, if any.
    pub fn thread_id(&self) -> Option<String> {
        lock_thread(&self.thread).thread_id().map(str::to_string)
    }

    /// Sends `user_text` to the assistant and records the exchange.
    ///
    /// The user message is appended before the remote call is issued. If the
    /// returned future is dropped mid-call, the exchange is closed with the
    /// fallback text.
    pub async fn send(&self, user_text: &str) -> SendOutcome {
        if user_text.trim().is_empty() {
            return SendOutcome::Skipped(SkipReason::EmptyInput);
        }

        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!("[ConversationController] Send ignored, a reply is still pending");
            return SendOutcome::Skipped(SkipReason::Busy);
        };

        let request = {
            let mut thread = lock_thread(&self.thread);
            thread.push(ConversationMessage::user(user_text));
            AssistantRequest {
                message: user_text.to_string(),
                thread_id: thread.thread_id().map(str::to_string),
                assistant_id: self.assistant_id.clone(),
            }
        };
        let exchange = PendingExchange::new(&self.thread);

        let reply = match tokio::time::timeout(self.reply_timeout, self.gateway.converse(&request))
            .await
        {
            Ok(Ok(reply)) => Some(reply),
            Ok(Err(e)) => {
                tracing::warn!("[ConversationController] Assistant call failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.reply_timeout.as_secs(),
                    "[ConversationController] Assistant call timed out"
                );
                None
            }
        };

        exchange.complete(reply)
    }
}

fn lock_thread(thread: &Mutex<ConversationThread>) -> MutexGuard<'_, ConversationThread> {
    thread.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Closes an exchange whose user message is already in the log.
///
/// Dropping it without calling `complete` appends the fallback text, so an
/// abandoned `send` still yields one assistant entry.
struct PendingExchange<'a> {
    thread: &'a Mutex<ConversationThread>,
    settled: bool,
}

impl<'a> PendingExchange<'a> {
    fn new(thread: &'a Mutex<ConversationThread>) -> Self {
        Self {
            thread,
            settled: false,
        }
    }

    fn complete(mut self, reply: Option<AssistantReply>) -> SendOutcome {
        self.settled = true;
        let mut thread = lock_thread(self.thread);

        let Some(reply) = reply else {
            thread.push(ConversationMessage::assistant(FALLBACK_REPLY));
            return SendOutcome::Fallback;
        };

        if let Some(thread_id) = reply.thread_id.as_deref()
            && thread.adopt_thread_id(thread_id)
        {
            tracing::info!(thread_id = %thread_id, "[ConversationController] Thread established");
        }

        match reply.text() {
            Some(text) => {
                thread.push(ConversationMessage::assistant(text));
                SendOutcome::Replied
            }
            None => {
                tracing::debug!("[ConversationController] Assistant reply had no text");
                thread.push(ConversationMessage::assistant(FALLBACK_REPLY));
                SendOutcome::Fallback
            }
        }
    }
}

impl Drop for PendingExchange<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("[ConversationController] Send abandoned before the reply arrived");
            lock_thread(self.thread).push(ConversationMessage::assistant(FALLBACK_REPLY));
        }
    }
}
