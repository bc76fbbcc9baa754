//! Session resolution: access token to lead record.

use chrono::Utc;
use portal_core::lead::{AccessToken, LeadRecord, LeadRepository};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Message shown when a token cannot be resolved.
pub const ACCESS_DENIED_MESSAGE: &str = "Demo not found or has expired";

/// Opaque resolution failure.
///
/// Unknown tokens, lookup failures and unusable records all produce this same
/// value, so callers cannot tell which tokens exist.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{}", ACCESS_DENIED_MESSAGE)]
pub struct AccessDenied;

/// Resolves access tokens to lead records for one session.
///
/// On the first successful resolution of a lead, a "demo opened" timestamp is
/// written to the record store in the background. Later resolutions of the
/// same token return the cached record and write nothing.
pub struct SessionResolver {
    repository: Arc<dyn LeadRepository>,
    /// Last successful resolution.
    resolved: tokio::sync::Mutex<Option<(AccessToken, LeadRecord)>>,
    /// Lead ids whose opened timestamp has already been scheduled.
    opened: Mutex<HashSet<String>>,
    /// Background opened-timestamp writes not yet awaited.
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionResolver {
    /// Creates a resolver over an explicitly constructed record store client.
    pub fn new(repository: Arc<dyn LeadRepository>) -> Self {
        Self {
            repository,
            resolved: tokio::sync::Mutex::new(None),
            opened: Mutex::new(HashSet::new()),
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    /// Resolves `token` to its lead record.
    ///
    /// Never waits for the opened-timestamp write.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] when no single lead matches, when the lookup
    /// fails for any reason, or when the stored business data cannot be
    /// normalized.
    pub async fn resolve(&self, token: &AccessToken) -> Result<LeadRecord, AccessDenied> {
        let mut resolved = self.resolved.lock().await;
        if let Some((cached_token, lead)) = resolved.as_ref()
            && cached_token == token
        {
            tracing::debug!(lead_id = %lead.id, "[SessionResolver] Returning cached lead");
            return Ok(lead.clone());
        }

        if token.is_empty() {
            tracing::debug!("[SessionResolver] Empty access token");
            return Err(AccessDenied);
        }

        let stored = match self.repository.find_by_token(token).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::debug!("[SessionResolver] No lead matches the access token");
                return Err(AccessDenied);
            }
            Err(e) => {
                tracing::warn!("[SessionResolver] Lead lookup failed: {}", e);
                return Err(AccessDenied);
            }
        };

        if stored.has_encoded_business_data() {
            tracing::debug!(
                lead_id = %stored.id,
                "[SessionResolver] business_data arrived JSON-encoded"
            );
        }

        let lead_id = stored.id.clone();
        let lead = stored.normalize().map_err(|e| {
            tracing::warn!(lead_id = %lead_id, "[SessionResolver] Unusable business_data: {}", e);
            AccessDenied
        })?;

        tracing::info!(lead_id = %lead.id, "[SessionResolver] Lead resolved");
        self.record_opened(&lead.id);

        *resolved = Some((token.clone(), lead.clone()));
        Ok(lead)
    }

    /// Schedules the opened-timestamp write, at most once per lead.
    fn record_opened(&self, lead_id: &str) {
        {
            let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
            if !opened.insert(lead_id.to_string()) {
                return;
            }
        }

        let repository = Arc::clone(&self.repository);
        let lead_id = lead_id.to_string();
        let handle = tokio::spawn(async move {
            match repository.mark_demo_opened(&lead_id, Utc::now()).await {
                Ok(()) => tracing::debug!(lead_id = %lead_id, "[SessionResolver] Demo open recorded"),
                Err(e) => tracing::warn!(
                    lead_id = %lead_id,
                    "[SessionResolver] Failed to record demo open: {}",
                    e
                ),
            }
        });

        self.pending_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Waits for background opened-timestamp writes to finish.
    ///
    /// Write failures were already logged and are not reported here.
    pub async fn settle(&self) {
        let handles = std::mem::take(
            &mut *self
                .pending_writes
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("[SessionResolver] Opened-timestamp task aborted: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockLeadRepository, stored_lead};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_unknown_token_is_denied_without_write() {
        let repository = Arc::new(MockLeadRepository::new());
        let resolver = SessionResolver::new(repository.clone());

        let result = resolver.resolve(&AccessToken::new("nope")).await;
        resolver.settle().await;

        assert_eq!(result, Err(AccessDenied));
        assert!(repository.opened_ids().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_indistinguishable_from_absence() {
        let repository = Arc::new(MockLeadRepository::new().failing_lookups());
        let resolver = SessionResolver::new(repository.clone());

        let result = resolver.resolve(&AccessToken::new("test-token-123")).await;

        assert_eq!(result, Err(AccessDenied));
        assert_eq!(result.unwrap_err().to_string(), ACCESS_DENIED_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_token_skips_lookup() {
        let repository = Arc::new(MockLeadRepository::new());
        let resolver = SessionResolver::new(repository.clone());

        assert_eq!(resolver.resolve(&AccessToken::new("")).await, Err(AccessDenied));
        assert_eq!(repository.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_encoded_and_structured_business_data_resolve_identically() {
        let business = json!({
            "business_name": "Acme",
            "services": ["Plumbing", "Heating"],
            "value_proposition": "Fast local repairs"
        });
        let repository = Arc::new(
            MockLeadRepository::new()
                .with_lead("structured", stored_lead("lead-1", business.clone()))
                .with_lead("encoded", stored_lead("lead-1", json!(business.to_string()))),
        );
        let structured = SessionResolver::new(repository.clone())
            .resolve(&AccessToken::new("structured"))
            .await
            .unwrap();
        let encoded = SessionResolver::new(repository.clone())
            .resolve(&AccessToken::new("encoded"))
            .await
            .unwrap();

        assert_eq!(structured, encoded);
        assert_eq!(structured.business_data.business_name, "Acme");
    }

    #[tokio::test]
    async fn test_malformed_business_data_is_denied() {
        let repository = Arc::new(
            MockLeadRepository::new()
                .with_lead("broken", stored_lead("lead-1", json!("{not json"))),
        );
        let resolver = SessionResolver::new(repository.clone());

        let result = resolver.resolve(&AccessToken::new("broken")).await;
        resolver.settle().await;

        assert_eq!(result, Err(AccessDenied));
        assert!(repository.opened_ids().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_resolution_writes_opened_once() {
        let repository = Arc::new(MockLeadRepository::acme());
        let resolver = SessionResolver::new(repository.clone());
        let token = AccessToken::new("test-token-123");

        let first = resolver.resolve(&token).await.unwrap();
        let second = resolver.resolve(&token).await.unwrap();
        resolver.settle().await;

        assert_eq!(first, second);
        assert_eq!(repository.lookup_count(), 1);
        assert_eq!(repository.opened_ids(), vec!["lead-1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_opened_write_does_not_delay_resolution() {
        let write_delay = Duration::from_secs(10);
        let repository = Arc::new(MockLeadRepository::acme().with_write_delay(write_delay));
        let resolver = SessionResolver::new(repository.clone());

        let started = Instant::now();
        let lead = resolver.resolve(&AccessToken::new("test-token-123")).await;

        assert_eq!(lead.unwrap().id, "lead-1");
        assert!(started.elapsed() < write_delay);
        assert!(repository.opened_ids().is_empty());

        resolver.settle().await;
        assert!(started.elapsed() >= write_delay);
        assert_eq!(repository.opened_ids(), vec!["lead-1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_opened_write_does_not_fail_resolution() {
        let repository = Arc::new(MockLeadRepository::acme().failing_writes());
        let resolver = SessionResolver::new(repository.clone());

        let lead = resolver.resolve(&AccessToken::new("test-token-123")).await;
        resolver.settle().await;

        assert_eq!(lead.unwrap().id, "lead-1");
        assert_eq!(repository.write_attempts(), 1);
    }
}
