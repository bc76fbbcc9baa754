//! Application layer for Portal.
//!
//! Coordinates the record store and the remote assistant into a portal
//! session: token resolution first, then the conversation.

pub mod conversation;
pub mod portal;
pub mod session_resolver;

#[cfg(test)]
mod test_support;

pub use conversation::{ConversationController, SendOutcome, SkipReason};
pub use portal::{Briefing, ChatPortal, PortalGate};
pub use session_resolver::{AccessDenied, SessionResolver};
