//! Configuration service implementation.
//!
//! Loads `~/.config/portal/secret.json` and fills anything it leaves out from
//! environment variables, then from built-in defaults.
//!
//! Priority: secret.json > environment variables > defaults

use crate::paths::PortalPaths;
use portal_core::config::{
    AssistantConfig, PortalConfig, RecordStoreConfig, SecretConfig, DEFAULT_CHAT_TIMEOUT_SECS,
    DEFAULT_CHAT_WEBHOOK_URL, DEFAULT_LEADS_TABLE,
};
use portal_core::error::{PortalError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_LEADS_TABLE: &str = "PORTAL_LEADS_TABLE";
pub const ENV_CHAT_WEBHOOK_URL: &str = "PORTAL_CHAT_WEBHOOK_URL";
pub const ENV_CHAT_TIMEOUT_SECS: &str = "PORTAL_CHAT_TIMEOUT_SECS";

/// Configuration service resolving a [`PortalConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    /// Explicit secret file; `None` means the platform default location.
    secret_path: Option<PathBuf>,
}

impl ConfigService {
    /// Creates a service reading the default `secret.json` location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service reading the given secret file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            secret_path: Some(path.into()),
        }
    }

    fn secret_path(&self) -> Option<PathBuf> {
        match &self.secret_path {
            Some(path) => Some(path.clone()),
            None => PortalPaths::secret_file().ok(),
        }
    }

    /// Loads `secret.json`. A missing file yields an empty configuration.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        match self.secret_path() {
            Some(path) if path.exists() => read_secret_file(&path),
            Some(path) => {
                tracing::debug!(path = %path.display(), "No secret file, using environment");
                Ok(SecretConfig::default())
            }
            None => Ok(SecretConfig::default()),
        }
    }

    /// Resolves the full configuration from the secret file and the process
    /// environment.
    pub fn load(&self) -> Result<PortalConfig> {
        let secrets = self.load_secrets()?;
        resolve_config(&secrets, |key| env::var(key).ok())
    }
}

fn read_secret_file(path: &Path) -> Result<SecretConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        PortalError::config(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        PortalError::config(format!(
            "Failed to parse configuration file at {}: {}",
            path.display(),
            e
        ))
    })
}

/// Merges secret file values with values looked up through `env`.
///
/// Blank values count as missing. The record store URL and anon key have no
/// default and must come from one of the two sources.
pub fn resolve_config<F>(secrets: &SecretConfig, env: F) -> Result<PortalConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let supabase = secrets.supabase.clone().unwrap_or_default();
    let chat = secrets.chat.clone().unwrap_or_default();

    let url = present(supabase.url)
        .or_else(|| present(env(ENV_SUPABASE_URL)))
        .ok_or_else(|| {
            PortalError::config(format!(
                "{} not found in secret.json or environment variables",
                ENV_SUPABASE_URL
            ))
        })?;

    let anon_key = present(supabase.anon_key)
        .or_else(|| present(env(ENV_SUPABASE_ANON_KEY)))
        .ok_or_else(|| {
            PortalError::config(format!(
                "{} not found in secret.json or environment variables",
                ENV_SUPABASE_ANON_KEY
            ))
        })?;

    let table = present(supabase.table)
        .or_else(|| present(env(ENV_LEADS_TABLE)))
        .unwrap_or_else(|| DEFAULT_LEADS_TABLE.to_string());

    let webhook_url = present(chat.webhook_url)
        .or_else(|| present(env(ENV_CHAT_WEBHOOK_URL)))
        .unwrap_or_else(|| DEFAULT_CHAT_WEBHOOK_URL.to_string());

    let timeout_secs = match chat.timeout_secs {
        Some(secs) => secs,
        None => match present(env(ENV_CHAT_TIMEOUT_SECS)) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                PortalError::config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_CHAT_TIMEOUT_SECS, raw
                ))
            })?,
            None => DEFAULT_CHAT_TIMEOUT_SECS,
        },
    };
    if timeout_secs == 0 {
        return Err(PortalError::config("Chat timeout must be at least one second"));
    }

    Ok(PortalConfig {
        record_store: RecordStoreConfig::new(url, anon_key).with_table(table),
        assistant: AssistantConfig {
            webhook_url,
            timeout_secs,
        },
    })
}
