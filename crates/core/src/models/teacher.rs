use serde::{Deserialize, Serialize};

/// A teacher as normalized from the upstream record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    pub external_id: i64,
    pub external_dcid: i64,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Upstream staff status code; `None` when absent or unparsable.
    pub staff_status: Option<i64>,
    pub is_active: bool,
    /// Upstream school number of the teacher's home school.
    pub school_number: Option<i64>,
}

/// A persisted teacher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    pub external_id: i64,
    pub external_dcid: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_status: Option<i64>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<i64>,
}
