//! WebhookAssistantGateway - JSON webhook client for the remote assistant.
//!
//! The webhook fronts a hosted assistant: it takes one user message plus an
//! optional thread id, and answers with the reply text and the thread id to
//! use for the rest of the conversation.

use async_trait::async_trait;
use portal_core::config::AssistantConfig;
use portal_core::conversation::{AssistantGateway, AssistantReply, AssistantRequest};
use portal_core::error::{PortalError, Result};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Gateway implementation that posts to the chat webhook.
#[derive(Clone)]
pub struct WebhookAssistantGateway {
    client: Client,
    webhook_url: String,
    timeout: Duration,
}

impl WebhookAssistantGateway {
    /// Creates a new gateway posting to `webhook_url`.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let defaults = AssistantConfig::default();
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
            timeout: defaults.timeout(),
        }
    }

    /// Creates a gateway from resolved configuration.
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(config.webhook_url.clone()).with_timeout(config.timeout())
    }

    /// Sets the per-request transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shares an existing HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn build_request(&self, request: &AssistantRequest) -> RequestBuilder {
        self.client
            .post(&self.webhook_url)
            .json(request)
            .timeout(self.timeout)
    }
}

/// Decodes a webhook body. Anything that is not a JSON object is an error.
fn parse_reply(body: &str) -> Result<AssistantReply> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(PortalError::Serialization {
            format: "JSON".to_string(),
            message: "assistant reply is not an object".to_string(),
        });
    }
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl AssistantGateway for WebhookAssistantGateway {
    async fn converse(&self, request: &AssistantRequest) -> Result<AssistantReply> {
        tracing::debug!(
            assistant_id = %request.assistant_id,
            has_thread = request.thread_id.is_some(),
            "Posting message to assistant webhook"
        );

        let response = self.build_request(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PortalError::remote(format!(
                "Assistant webhook error ({}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        parse_reply(&body)
    }
}
