use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields of one upstream table inside a record. Values are usually strings
/// but numbers and nulls show up too.
pub type RawTable = Map<String, Value>;

/// OAuth token response from the upstream authorization endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<ExpiresIn>,
}

/// Lifetime of an issued token; some servers send it as a string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExpiresIn {
    Seconds(i64),
    Text(String),
}

impl TokenResponse {
    /// Token lifetime used when the server omits `expires_in` or sends garbage.
    pub const DEFAULT_LIFETIME_SECS: i64 = 3600;

    pub fn lifetime_secs(&self) -> i64 {
        match &self.expires_in {
            Some(ExpiresIn::Seconds(n)) => *n,
            Some(ExpiresIn::Text(s)) => s
                .trim()
                .parse()
                .unwrap_or(Self::DEFAULT_LIFETIME_SECS),
            None => Self::DEFAULT_LIFETIME_SECS,
        }
    }
}

/// Body of a successful named-query call.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub record: Vec<RawRecord>,
    #[serde(
        rename = "@extensions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub extensions: Option<String>,
}

/// One upstream record: the row id plus its columns grouped by table.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tables: BTreeMap<String, RawTable>,
}

impl RawRecord {
    pub fn table(&self, name: &str) -> Option<&RawTable> {
        self.tables.get(name)
    }
}

/// Result of a single query call, before any retry decision is made.
#[derive(Debug)]
pub enum QueryOutcome {
    Records(QueryResponse),
    Unauthorized,
    Failed { status: u16, body: String },
}
