//! Lead repository trait.
//!
//! Defines the interface to the external record store holding invited leads.

use super::model::{AccessToken, StoredLead};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// An abstract repository for looking up leads by access token.
///
/// This trait decouples session resolution from the concrete record store
/// (e.g., a PostgREST table, an in-memory fixture in tests).
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Finds the lead whose token equals `token`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StoredLead))`: Exactly one lead matched
    /// - `Ok(None)`: No lead matched (or the match was ambiguous)
    /// - `Err(_)`: The lookup itself failed
    async fn find_by_token(&self, token: &AccessToken) -> Result<Option<StoredLead>>;

    /// Records the time the demo was opened for the lead with `lead_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Timestamp written
    /// - `Err(_)`: Write failed
    async fn mark_demo_opened(&self, lead_id: &str, opened_at: DateTime<Utc>) -> Result<()>;
}
