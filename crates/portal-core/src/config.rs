use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_LEADS_TABLE: &str = "magic_link_leads";
pub const DEFAULT_TOKEN_COLUMN: &str = "demo_token";
pub const DEFAULT_OPENED_COLUMN: &str = "demo_opened_at";
pub const DEFAULT_CHAT_WEBHOOK_URL: &str = "https://n8n.thebrownmine.com/webhook/magic-link-chat";
pub const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 30;

/// Root structure of `secret.json`. Every field is optional; missing values
/// fall back to environment variables and then to defaults.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretConfig {
    #[serde(default)]
    pub supabase: Option<SupabaseSecret>,
    #[serde(default)]
    pub chat: Option<ChatSecret>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SupabaseSecret {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSecret {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Fully resolved configuration for one portal process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub record_store: RecordStoreConfig,
    pub assistant: AssistantConfig,
}

/// Connection settings for the lead record store (PostgREST).
#[derive(Clone, PartialEq, Eq)]
pub struct RecordStoreConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub token_column: String,
    pub opened_column: String,
}

impl RecordStoreConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            table: DEFAULT_LEADS_TABLE.to_string(),
            token_column: DEFAULT_TOKEN_COLUMN.to_string(),
            opened_column: DEFAULT_OPENED_COLUMN.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

impl fmt::Debug for RecordStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStoreConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("table", &self.table)
            .field("token_column", &self.token_column)
            .field("opened_column", &self.opened_column)
            .finish()
    }
}

/// Settings for the remote assistant webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub webhook_url: String,
    pub timeout_secs: u64,
}

impl AssistantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            webhook_url: DEFAULT_CHAT_WEBHOOK_URL.to_string(),
            timeout_secs: DEFAULT_CHAT_TIMEOUT_SECS,
        }
    }
}
