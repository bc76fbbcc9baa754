//! Portal gate: token resolution in front of the conversation.
//!
//! A [`ChatPortal`] only exists for a resolved lead, so a denied session has
//! no conversation controls to reach.

use crate::conversation::{
    ControllerState, ConversationController, DEFAULT_REPLY_TIMEOUT, SendOutcome,
};
use crate::session_resolver::{AccessDenied, SessionResolver};
use portal_core::conversation::{AssistantGateway, ConversationMessage};
use portal_core::lead::{AccessToken, LeadRecord, LeadRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// Number of services highlighted in the briefing.
pub const KEY_SERVICE_LIMIT: usize = 3;

/// Entry point for a portal session.
pub struct PortalGate {
    resolver: SessionResolver,
    gateway: Arc<dyn AssistantGateway>,
    reply_timeout: Duration,
}

impl PortalGate {
    /// Creates a gate over explicitly constructed record store and assistant
    /// clients.
    pub fn new(repository: Arc<dyn LeadRepository>, gateway: Arc<dyn AssistantGateway>) -> Self {
        Self {
            resolver: SessionResolver::new(repository),
            gateway,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Sets the upper bound on each assistant call made by portals from this
    /// gate.
    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    /// Resolves `token` and opens a chat portal for the lead.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] if the token cannot be resolved.
    pub async fn enter(&self, token: &AccessToken) -> Result<ChatPortal, AccessDenied> {
        let lead = self.resolver.resolve(token).await?;
        let controller = ConversationController::new(&lead, Arc::clone(&self.gateway))
            .with_reply_timeout(self.reply_timeout);
        let session_id = Uuid::new_v4();

        tracing::info!(
            session_id = %session_id,
            lead_id = %lead.id,
            "[PortalGate] Portal session opened"
        );

        Ok(ChatPortal {
            session_id,
            lead,
            controller,
        })
    }

    /// Waits for background record store writes started by `enter`.
    pub async fn settle(&self) {
        self.resolver.settle().await;
    }
}

/// A resolved portal session: the lead plus its conversation.
pub struct ChatPortal {
    session_id: Uuid,
    lead: LeadRecord,
    controller: ConversationController,
}

impl ChatPortal {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn lead(&self) -> &LeadRecord {
        &self.lead
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    pub fn briefing(&self) -> Briefing {
        Briefing::for_lead(&self.lead)
    }

    pub fn can_send(&self, user_text: &str) -> bool {
        self.controller.can_send(user_text)
    }

    /// Sends a message on this portal's conversation.
    pub async fn send(&self, user_text: &str) -> SendOutcome {
        let span = tracing::info_span!("portal_send", session_id = %self.session_id);
        self.controller.send(user_text).instrument(span).await
    }

    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.controller.messages()
    }

    pub fn thread_id(&self) -> Option<String> {
        self.controller.thread_id()
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }
}

/// Presentation-neutral summary of a lead, shown when a portal opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Briefing {
    pub business_name: String,
    pub contact_name: String,
    pub website_url: String,
    pub value_proposition: String,
    /// First few services, in stored order.
    pub key_services: Vec<String>,
    pub greeting: String,
}

impl Briefing {
    pub fn for_lead(lead: &LeadRecord) -> Self {
        let business = &lead.business_data;
        Self {
            business_name: business.business_name.clone(),
            contact_name: lead.name.clone(),
            website_url: lead.website_url.clone(),
            value_proposition: business.value_proposition.clone(),
            key_services: business.key_services(KEY_SERVICE_LIMIT).to_vec(),
            greeting: format!(
                "Initialized Strategic Assistant for {}. How can I assist with your business intelligence today?",
                business.business_name
            ),
        }
    }
}
