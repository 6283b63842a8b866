use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::db::repository::CredentialStore;
use crate::error::{Result, SlateError};

use super::client::PowerSchoolClient;

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Owns the bearer token lifecycle: reuse while fresh, otherwise acquire and persist.
///
/// Concurrent callers are not serialized; two runs that both find the cached
/// token stale will each request a new one.
pub struct TokenManager<'a, S: CredentialStore + ?Sized> {
    client: &'a PowerSchoolClient,
    store: &'a S,
    skew_secs: i64,
}

impl<'a, S: CredentialStore + ?Sized> TokenManager<'a, S> {
    pub fn new(client: &'a PowerSchoolClient, store: &'a S, skew_secs: i64) -> Self {
        Self {
            client,
            store,
            skew_secs,
        }
    }

    /// Return a token that is valid right now, acquiring one if the cache is empty or stale.
    pub async fn ensure_valid_token(&self) -> Result<String> {
        let credential = self.store.get_credential().await?;
        let missing = credential.missing_fields();
        if !missing.is_empty() {
            return Err(SlateError::AuthConfig(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        if let Some(token) = credential.usable_token(Utc::now(), self.skew_secs) {
            debug!("Reusing cached access token");
            return Ok(token.to_string());
        }

        Ok(self.fetch_new_token().await?.access_token)
    }

    /// Unconditionally request a new token and store it with its expiry.
    pub async fn fetch_new_token(&self) -> Result<IssuedToken> {
        let credential = self.store.get_credential().await?;
        let response = self
            .client
            .request_token(&credential.client_id, &credential.client_secret)
            .await?;

        let lifetime = response.lifetime_secs();
        let issued = IssuedToken {
            access_token: response.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        };
        self.store
            .save_token(&issued.access_token, issued.expires_at)
            .await?;

        info!(expires_at = %issued.expires_at, "Acquired new access token");
        Ok(issued)
    }
}
