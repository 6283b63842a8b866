use serde::{Deserialize, Serialize};

/// A contact email address as normalized from the upstream record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEmailAddress {
    pub external_id: i64,
    pub email_address: String,
}

/// A persisted contact email address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub id: i64,
    pub external_id: i64,
    pub email_address: String,
}
