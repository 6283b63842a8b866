use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of reference data a sync job pulls from the upstream system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Schools,
    Terms,
    Teachers,
    Courses,
    Contacts,
}

impl EntityType {
    /// All entity types in dependency order: schools before anything that references them.
    pub const ALL: [EntityType; 5] = [
        EntityType::Schools,
        EntityType::Terms,
        EntityType::Teachers,
        EntityType::Courses,
        EntityType::Contacts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Schools => "schools",
            EntityType::Terms => "terms",
            EntityType::Teachers => "teachers",
            EntityType::Courses => "courses",
            EntityType::Contacts => "contacts",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schools" => Ok(EntityType::Schools),
            "terms" => Ok(EntityType::Terms),
            "teachers" => Ok(EntityType::Teachers),
            "courses" => Ok(EntityType::Courses),
            "contacts" | "emails" => Ok(EntityType::Contacts),
            other => Err(format!("unknown entity type '{other}'")),
        }
    }
}

/// Status of a sync job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl SyncStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Completed | SyncStatus::Failed)
    }
}

/// One row of the sync ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncJob {
    pub id: i64,
    pub entity_type: EntityType,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub record_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// What a successful run hands back to its caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub entity: EntityType,
    pub job_id: i64,
    pub count: usize,
    pub duration_ms: u64,
    pub preview: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sync_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&SyncStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(!SyncStatus::Pending.is_terminal());
        assert!(!SyncStatus::Running.is_terminal());
        assert!(SyncStatus::Completed.is_terminal());
        assert!(SyncStatus::Failed.is_terminal());
    }

    #[test]
    fn entity_type_parses_from_str() {
        for entity in EntityType::ALL {
            assert_eq!(entity.as_str().parse::<EntityType>().unwrap(), entity);
        }
        assert_eq!(
            "emails".parse::<EntityType>().unwrap(),
            EntityType::Contacts
        );
        assert!("students".parse::<EntityType>().is_err());
    }

    #[test]
    fn schools_come_first() {
        assert_eq!(EntityType::ALL[0], EntityType::Schools);
    }

    #[test]
    fn sync_job_camel_case_fields() {
        let job = SyncJob {
            id: 7,
            entity_type: EntityType::Terms,
            status: SyncStatus::Completed,
            started_at: Some(Utc.with_ymd_and_hms(2025, 9, 15, 12, 0, 0).unwrap()),
            completed_at: Some(Utc.with_ymd_and_hms(2025, 9, 15, 12, 0, 3).unwrap()),
            record_count: 4,
            result_summary: Some(serde_json::json!({"count": 4})),
            error_message: None,
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"entityType\":\"terms\""));
        assert!(json.contains("\"recordCount\":4"));
        assert!(json.contains("\"resultSummary\""));
        assert!(!json.contains("errorMessage"));
    }

    #[test]
    fn sync_result_camel_case_fields() {
        let result = SyncResult {
            success: true,
            entity: EntityType::Schools,
            job_id: 1,
            count: 2,
            duration_ms: 15,
            preview: vec![],
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["durationMs"], 15);
        assert_eq!(v["jobId"], 1);
        assert_eq!(v["entity"], "schools");
    }
}
