use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::db::repository::CredentialStore;
use crate::error::{Result, SlateError};

use super::client::PowerSchoolClient;
use super::models::{QueryOutcome, RawRecord};
use super::token::TokenManager;

/// Drives named-query calls for one sync run.
///
/// Every call is allowed a single token refresh on 401. A refreshed token is
/// kept for the rest of the run.
pub struct PaginatedCollector<'a, S: CredentialStore + ?Sized> {
    client: &'a PowerSchoolClient,
    tokens: &'a TokenManager<'a, S>,
    token: String,
    refreshes: u32,
}

impl<'a, S: CredentialStore + ?Sized> PaginatedCollector<'a, S> {
    pub fn new(
        client: &'a PowerSchoolClient,
        tokens: &'a TokenManager<'a, S>,
        initial_token: String,
    ) -> Self {
        Self {
            client,
            tokens,
            token: initial_token,
            refreshes: 0,
        }
    }

    /// Token refreshes performed so far in this run.
    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    /// Walk `[startrow, endrow]` windows of `page_size` rows until a short or empty page.
    ///
    /// A result set that is an exact multiple of `page_size` costs one extra
    /// call returning no rows, since the upstream reports no total.
    pub async fn collect(&mut self, query_name: &str, page_size: u32) -> Result<Vec<RawRecord>> {
        if page_size == 0 {
            return Err(SlateError::Config("page size must be greater than zero".into()));
        }

        let page_size = u64::from(page_size);
        let mut records = Vec::new();
        let mut start_row: u64 = 1;
        let mut pages = 0u32;

        loop {
            let end_row = start_row + page_size - 1;
            let body = json!({ "startrow": start_row, "endrow": end_row });
            let page = self.fetch_once(query_name, &body).await?;
            pages += 1;

            let page_len = page.len() as u64;
            debug!(query = %query_name, start_row, end_row, page_len, "Fetched page");
            records.extend(page);

            if page_len < page_size {
                break;
            }
            start_row += page_size;
        }

        info!(query = %query_name, pages, count = records.len(), "Collected paginated query");
        Ok(records)
    }

    /// Issue one query call, refreshing the token at most once on 401.
    pub async fn fetch_once(&mut self, query_name: &str, body: &Value) -> Result<Vec<RawRecord>> {
        let mut retried = false;
        loop {
            match self.client.post_query(query_name, &self.token, body).await? {
                QueryOutcome::Records(response) => return Ok(response.record),
                QueryOutcome::Unauthorized if !retried => {
                    warn!(query = %query_name, "Access token rejected, refreshing once");
                    self.token = self.tokens.fetch_new_token().await?.access_token;
                    self.refreshes += 1;
                    retried = true;
                }
                QueryOutcome::Unauthorized => {
                    return Err(SlateError::UpstreamApi {
                        status: 401,
                        body: "unauthorized after token refresh".into(),
                    });
                }
                QueryOutcome::Failed { status, body } => {
                    return Err(SlateError::UpstreamApi { status, body });
                }
            }
        }
    }
}
