//! Upstream connection credentials and the cached OAuth token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-wide upstream connection state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub endpoint: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Names of the connection fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.endpoint.trim().is_empty() {
            missing.push("endpoint");
        }
        if self.client_id.trim().is_empty() {
            missing.push("client_id");
        }
        if self.client_secret.trim().is_empty() {
            missing.push("client_secret");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// The cached token, if present and not expiring within `skew_secs` of `now`.
    pub fn usable_token(&self, now: DateTime<Utc>, skew_secs: i64) -> Option<&str> {
        let token = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        let expires_at = self.token_expires_at?;
        if expires_at - chrono::Duration::seconds(skew_secs) > now {
            Some(token)
        } else {
            None
        }
    }
}
