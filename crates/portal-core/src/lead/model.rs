//! Lead domain model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{PortalError, Result};

/// Opaque credential taken from the invitation link.
///
/// The token is never validated beyond presence. `Debug` is redacted so a
/// token does not end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Business profile embedded in a lead record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessData {
    #[serde(alias = "businessName")]
    pub business_name: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(alias = "valueProposition", default)]
    pub value_proposition: String,
}

impl BusinessData {
    /// Normalizes a stored `business_data` value.
    ///
    /// The record store returns this column either as a JSON object or as a
    /// JSON-encoded string of the same object. Both yield the same result.
    pub fn from_stored(value: Value) -> Result<Self> {
        match value {
            Value::String(encoded) => Ok(serde_json::from_str(&encoded)?),
            Value::Null => Err(PortalError::Serialization {
                format: "JSON".to_string(),
                message: "business_data is missing".to_string(),
            }),
            structured => Ok(serde_json::from_value(structured)?),
        }
    }

    /// Returns at most `limit` services, in stored order.
    pub fn key_services(&self, limit: usize) -> &[String] {
        let end = self.services.len().min(limit);
        &self.services[..end]
    }
}

/// A lead row exactly as the record store hands it over.
///
/// Field names accept both the snake_case column names and camelCase.
/// `business_data` is left unparsed; see [`StoredLead::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLead {
    pub id: String,
    pub name: String,
    #[serde(alias = "websiteUrl")]
    pub website_url: String,
    #[serde(alias = "assistantId")]
    pub assistant_id: String,
    #[serde(alias = "businessData", default)]
    pub business_data: Value,
}

impl StoredLead {
    /// Returns true when `business_data` arrived as a JSON-encoded string.
    pub fn has_encoded_business_data(&self) -> bool {
        self.business_data.is_string()
    }

    /// Converts the stored row into a [`LeadRecord`].
    ///
    /// Fails without producing a partial record if `business_data` cannot be
    /// parsed.
    pub fn normalize(self) -> Result<LeadRecord> {
        let business_data = BusinessData::from_stored(self.business_data)?;
        Ok(LeadRecord {
            id: self.id,
            name: self.name,
            website_url: self.website_url,
            assistant_id: self.assistant_id,
            business_data,
        })
    }
}

/// A resolved lead. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    /// Display name of the invited contact.
    pub name: String,
    /// Site shown in the preview.
    pub website_url: String,
    /// Remote assistant configuration to converse with.
    pub assistant_id: String,
    pub business_data: BusinessData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn acme_business() -> Value {
        json!({
            "business_name": "Acme",
            "services": ["Plumbing", "Heating", "Cooling", "Drainage"],
            "value_proposition": "Fast local repairs"
        })
    }

    #[test]
    fn test_structured_and_encoded_business_data_match() {
        let structured = BusinessData::from_stored(acme_business()).unwrap();
        let encoded =
            BusinessData::from_stored(Value::String(acme_business().to_string())).unwrap();

        assert_eq!(structured, encoded);
        assert_eq!(structured.business_name, "Acme");
        assert_eq!(structured.services.len(), 4);
    }

    #[test]
    fn test_business_data_accepts_camel_case() {
        let data = BusinessData::from_stored(json!({
            "businessName": "Acme",
            "services": ["Plumbing"],
            "valueProposition": "Fast local repairs"
        }))
        .unwrap();

        assert_eq!(data.business_name, "Acme");
        assert_eq!(data.value_proposition, "Fast local repairs");
    }

    #[test]
    fn test_malformed_business_data_is_rejected() {
        let err = BusinessData::from_stored(Value::String("{not json".to_string())).unwrap_err();
        assert!(err.is_serialization());

        let err = BusinessData::from_stored(Value::Null).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_key_services_limits_in_order() {
        let data = BusinessData::from_stored(acme_business()).unwrap();
        assert_eq!(data.key_services(3), ["Plumbing", "Heating", "Cooling"]);
        assert_eq!(data.key_services(10).len(), 4);
    }

    #[test]
    fn test_stored_lead_deserializes_both_casings() {
        let snake: StoredLead = serde_json::from_value(json!({
            "id": "lead-1",
            "name": "Jane",
            "website_url": "https://acme.example",
            "assistant_id": "asst_1",
            "business_data": acme_business().to_string(),
            "demo_token": "ignored"
        }))
        .unwrap();
        let camel: StoredLead = serde_json::from_value(json!({
            "id": "lead-1",
            "name": "Jane",
            "websiteUrl": "https://acme.example",
            "assistantId": "asst_1",
            "businessData": acme_business()
        }))
        .unwrap();

        assert!(snake.has_encoded_business_data());
        assert!(!camel.has_encoded_business_data());
        assert_eq!(snake.normalize().unwrap(), camel.normalize().unwrap());
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("test-token-123");
        assert_eq!(format!("{:?}", token), "AccessToken(<redacted>)");
        assert_eq!(token.as_str(), "test-token-123");
        assert!(AccessToken::new("  ").is_empty());
    }
}
