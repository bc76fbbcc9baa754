//! PostgREST-backed lead repository.
//!
//! Talks to a Supabase table over its REST interface using the project's
//! anonymous key. The client is constructed once by the caller and injected
//! wherever a `LeadRepository` is needed.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use portal_core::config::RecordStoreConfig;
use portal_core::error::{PortalError, Result};
use portal_core::lead::{AccessToken, LeadRepository, StoredLead};
use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value};
use std::time::Duration;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Lead repository backed by a PostgREST table.
#[derive(Clone)]
pub struct SupabaseLeadRepository {
    client: Client,
    config: RecordStoreConfig,
}

impl SupabaseLeadRepository {
    /// Creates a repository with its own HTTP client.
    pub fn new(config: RecordStoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Creates a repository sharing an existing HTTP client.
    pub fn with_client(client: Client, config: RecordStoreConfig) -> Self {
        Self { client, config }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    fn lookup_request(&self, token: &AccessToken) -> RequestBuilder {
        let filter = format!("eq.{}", token.as_str());
        self.authorize(self.client.get(self.table_url()))
            .query(&[
                ("select", "*"),
                (self.config.token_column.as_str(), filter.as_str()),
            ])
            .timeout(LOOKUP_TIMEOUT)
    }

    fn opened_request(&self, lead_id: &str, opened_at: DateTime<Utc>) -> RequestBuilder {
        let filter = format!("eq.{}", lead_id);
        let mut body = Map::new();
        body.insert(
            self.config.opened_column.clone(),
            Value::String(opened_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        self.authorize(self.client.patch(self.table_url()))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&Value::Object(body))
            .timeout(WRITE_TIMEOUT)
    }
}

/// Keeps a lookup result only when exactly one row matched.
fn single_row<T>(rows: Vec<T>) -> Option<T> {
    if rows.len() > 1 {
        tracing::warn!(matches = rows.len(), "Token matched more than one lead");
        return None;
    }
    rows.into_iter().next()
}

#[async_trait]
impl LeadRepository for SupabaseLeadRepository {
    async fn find_by_token(&self, token: &AccessToken) -> Result<Option<StoredLead>> {
        let response = self.lookup_request(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PortalError::data_access(format!(
                "Lead lookup failed ({}): {}",
                status, error_text
            )));
        }

        let rows: Vec<StoredLead> = response.json().await?;
        Ok(single_row(rows))
    }

    async fn mark_demo_opened(&self, lead_id: &str, opened_at: DateTime<Utc>) -> Result<()> {
        let response = self.opened_request(lead_id, opened_at).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::data_access(format!(
                "Failed to record demo open for lead '{}' ({})",
                lead_id, status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::Method;

    fn repository() -> SupabaseLeadRepository {
        SupabaseLeadRepository::new(RecordStoreConfig::new(
            "https://xyz.supabase.co/",
            "anon-key",
        ))
    }

    fn query_value(request: &reqwest::Request, key: &str) -> Option<String> {
        request
            .url()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_lookup_request_filters_by_token() {
        let request = repository()
            .lookup_request(&AccessToken::new("test-token-123"))
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().path(), "/rest/v1/magic_link_leads");
        assert_eq!(query_value(&request, "select").as_deref(), Some("*"));
        assert_eq!(
            query_value(&request, "demo_token").as_deref(),
            Some("eq.test-token-123")
        );
        assert_eq!(request.headers()["apikey"], "anon-key");
        assert_eq!(request.headers()["authorization"], "Bearer anon-key");
    }

    #[test]
    fn test_opened_request_patches_by_id() {
        let opened_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let request = repository()
            .opened_request("lead-1", opened_at)
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::PATCH);
        assert_eq!(query_value(&request, "id").as_deref(), Some("eq.lead-1"));
        assert_eq!(request.headers()["prefer"], "return=minimal");

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let json: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json["demo_opened_at"], "2026-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_single_row_requires_exactly_one_match() {
        assert_eq!(single_row::<u8>(vec![]), None);
        assert_eq!(single_row(vec![1]), Some(1));
        assert_eq!(single_row(vec![1, 2]), None);
    }
}
