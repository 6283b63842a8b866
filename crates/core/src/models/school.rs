use serde::{Deserialize, Serialize};

/// A school as normalized from the upstream record, keyed by its external id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSchool {
    pub external_id: i64,
    pub name: String,
    pub school_number: i64,
}

/// A persisted school.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub school_number: i64,
}
