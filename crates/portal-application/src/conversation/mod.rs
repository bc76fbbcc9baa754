//! Conversation control for a resolved portal session.

mod busy;
mod controller;

pub use controller::{
    ControllerState, ConversationController, DEFAULT_REPLY_TIMEOUT, FALLBACK_REPLY, SendOutcome,
    SkipReason,
};
