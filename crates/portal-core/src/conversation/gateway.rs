//! Remote assistant gateway trait and wire types.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body sent to the remote assistant for one user message.
///
/// `thread_id` serializes as `null` until the remote has minted a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub message: String,
    pub thread_id: Option<String>,
    pub assistant_id: String,
}

/// Reply from the remote assistant. Both fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(rename = "threadId", alias = "thread_id", default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl AssistantReply {
    /// Returns the reply text if it is present and non-empty.
    ///
    /// Whitespace-only text counts as present.
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().filter(|text| !text.is_empty())
    }
}

/// An abstract client for the remote conversational assistant.
///
/// Implementations perform exactly one remote call per `converse`. Transport
/// failures, non-success statuses and undecodable bodies are all reported as
/// `Err`.
#[async_trait]
pub trait AssistantGateway: Send + Sync {
    async fn converse(&self, request: &AssistantRequest) -> Result<AssistantReply>;
}
