use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{Result, SlateError};

use super::models::{QueryOutcome, QueryResponse, TokenResponse};

/// HTTP client for the PowerSchool OAuth and named-query endpoints.
///
/// The client holds no token; callers pass one per request so the token
/// lifecycle stays with the token manager.
#[derive(Clone)]
pub struct PowerSchoolClient {
    endpoint: String,
    http: Client,
}

impl PowerSchoolClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(endpoint, http))
    }

    /// Create a client with a custom reqwest::Client (useful for testing).
    pub fn with_http_client(endpoint: &str, http: Client) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Exchange client credentials for a bearer token.
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse> {
        let url = format!("{}/oauth/access_token", self.endpoint);
        debug!(url = %url, "Requesting access token");

        let response = self
            .http
            .post(&url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Token request rejected");
            return Err(SlateError::AuthAcquisition {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| SlateError::Serialization(format!("failed to parse token response: {e}")))
    }

    /// POST a named query. A 401 is reported as [`QueryOutcome::Unauthorized`]
    /// so the caller can decide whether to refresh and retry.
    pub async fn post_query(
        &self,
        query_name: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Result<QueryOutcome> {
        let url = format!("{}/ws/schema/query/{query_name}", self.endpoint);
        debug!(url = %url, body = %body, "Posting query");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!(query = %query_name, "Query rejected as unauthorized");
            return Ok(QueryOutcome::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, query = %query_name, "Query request failed");
            return Ok(QueryOutcome::Failed {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: QueryResponse = serde_json::from_str(&text).map_err(|e| {
            SlateError::Serialization(format!("failed to parse response for {query_name}: {e}"))
        })?;
        Ok(QueryOutcome::Records(parsed))
    }
}
