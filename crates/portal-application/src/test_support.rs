//! Test doubles for the record store and the remote assistant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_core::conversation::{AssistantGateway, AssistantReply, AssistantRequest};
use portal_core::error::{PortalError, Result};
use portal_core::lead::{AccessToken, LeadRepository, StoredLead};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn stored_lead(id: &str, business_data: Value) -> StoredLead {
    StoredLead {
        id: id.to_string(),
        name: "Jane Doe".to_string(),
        website_url: "https://acme.example".to_string(),
        assistant_id: "asst_acme".to_string(),
        business_data,
    }
}

pub struct MockLeadRepository {
    leads: HashMap<String, StoredLead>,
    fail_lookups: bool,
    fail_writes: bool,
    write_delay: Option<Duration>,
    lookups: AtomicUsize,
    write_attempts: AtomicUsize,
    opened: Mutex<Vec<String>>,
}

impl MockLeadRepository {
    pub fn new() -> Self {
        Self {
            leads: HashMap::new(),
            fail_lookups: false,
            fail_writes: false,
            write_delay: None,
            lookups: AtomicUsize::new(0),
            write_attempts: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Repository holding the Acme lead under `test-token-123`.
    pub fn acme() -> Self {
        Self::new().with_lead(
            "test-token-123",
            stored_lead(
                "lead-1",
                json!({
                    "business_name": "Acme",
                    "services": ["Plumbing", "Heating", "Cooling", "Drainage"],
                    "value_proposition": "Fast local repairs"
                }),
            ),
        )
    }

    pub fn with_lead(mut self, token: &str, lead: StoredLead) -> Self {
        self.leads.insert(token.to_string(), lead);
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Makes every opened-timestamp write take `delay` before it lands.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub fn opened_ids(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeadRepository for MockLeadRepository {
    async fn find_by_token(&self, token: &AccessToken) -> Result<Option<StoredLead>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups {
            return Err(PortalError::data_access("connection refused"));
        }
        Ok(self.leads.get(token.as_str()).cloned())
    }

    async fn mark_demo_opened(&self, lead_id: &str, _opened_at: DateTime<Utc>) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes {
            return Err(PortalError::data_access("write rejected"));
        }
        self.opened.lock().unwrap().push(lead_id.to_string());
        Ok(())
    }
}

/// Gateway answering from a queue of scripted results.
///
/// An exhausted script answers with a transport error.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<AssistantReply>>>,
    requests: Mutex<Vec<AssistantRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Result<AssistantReply>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<AssistantRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssistantGateway for ScriptedGateway {
    async fn converse(&self, request: &AssistantRequest) -> Result<AssistantReply> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortalError::remote("connection reset")))
    }
}

pub fn reply(thread_id: Option<&str>, response: Option<&str>) -> Result<AssistantReply> {
    Ok(AssistantReply {
        thread_id: thread_id.map(str::to_string),
        response: response.map(str::to_string),
    })
}
