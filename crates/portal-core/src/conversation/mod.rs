//! Conversation domain module.
//!
//! This module contains the message log, the thread continuity handle and the
//! interface to the remote assistant.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`MessageRole`, `ConversationMessage`)
//! - `thread`: Session-scoped log plus thread id (`ConversationThread`)
//! - `gateway`: Remote assistant interface (`AssistantGateway`)

mod gateway;
mod message;
mod thread;

pub use gateway::{AssistantGateway, AssistantReply, AssistantRequest};
pub use message::{ConversationMessage, MessageRole};
pub use thread::ConversationThread;
