//! Remote assistant clients for Portal.

pub mod webhook_assistant;

pub use webhook_assistant::WebhookAssistantGateway;
