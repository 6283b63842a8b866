use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    course::{Course, NewCourse},
    credential::Credential,
    email::{EmailAddress, NewEmailAddress},
    school::{NewSchool, School},
    sync::{EntityType, SyncJob, SyncStatus},
    teacher::{NewTeacher, Teacher},
    term::{NewTerm, Term},
};

/// Upstream connection settings and the cached token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// The stored credential; an empty one when nothing has been configured.
    async fn get_credential(&self) -> Result<Credential>;
    /// Replace the connection settings. The cached token is dropped when any of them change.
    async fn configure_credential(
        &self,
        endpoint: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<()>;
    async fn save_token(&self, access_token: &str, expires_at: DateTime<Utc>) -> Result<()>;
}

/// Batch upserts are all-or-nothing and keyed by `external_id`.
#[async_trait]
pub trait SchoolRepository: Send + Sync {
    async fn upsert_schools(&self, schools: &[NewSchool]) -> Result<()>;
    async fn get_school_by_external_id(&self, external_id: i64) -> Result<Option<School>>;
    async fn list_schools(&self) -> Result<Vec<School>>;
}

#[async_trait]
pub trait TermRepository: Send + Sync {
    /// Upsert the batch and, when `current` is set, move the current flag to
    /// that term. Both happen in one transaction; with `None` existing flags
    /// are left as they are.
    async fn upsert_terms(&self, terms: &[NewTerm], current: Option<i64>) -> Result<()>;
    async fn get_term_by_external_id(&self, external_id: i64) -> Result<Option<Term>>;
    async fn list_terms(&self) -> Result<Vec<Term>>;
    async fn get_current_term(&self) -> Result<Option<Term>>;
}

#[async_trait]
pub trait TeacherRepository: Send + Sync {
    async fn upsert_teachers(&self, teachers: &[NewTeacher]) -> Result<()>;
    async fn get_teacher_by_external_id(&self, external_id: i64) -> Result<Option<Teacher>>;
    async fn list_teachers(&self) -> Result<Vec<Teacher>>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn upsert_courses(&self, courses: &[NewCourse]) -> Result<()>;
    async fn get_course_by_external_id(&self, external_id: i64) -> Result<Option<Course>>;
    async fn list_courses(&self) -> Result<Vec<Course>>;
}

#[async_trait]
pub trait EmailAddressRepository: Send + Sync {
    async fn upsert_email_addresses(&self, emails: &[NewEmailAddress]) -> Result<()>;
    async fn get_email_address_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<EmailAddress>>;
    async fn list_email_addresses(&self) -> Result<Vec<EmailAddress>>;
}

/// Storage behind the sync ledger.
#[async_trait]
pub trait SyncJobRepository: Send + Sync {
    async fn create_sync_job(&self, entity_type: EntityType) -> Result<SyncJob>;
    /// Move a pending job to running. Returns `false` if the job was not pending.
    async fn mark_sync_job_running(&self, id: i64) -> Result<bool>;
    /// Move a running job to a terminal status and return the updated row.
    /// Returns `None` if the job was not running.
    async fn finish_sync_job(
        &self,
        id: i64,
        status: SyncStatus,
        record_count: i64,
        result_summary: Option<&serde_json::Value>,
        error_message: Option<&str>,
    ) -> Result<Option<SyncJob>>;
    async fn get_sync_job(&self, id: i64) -> Result<Option<SyncJob>>;
    async fn get_latest_sync_job(&self, entity_type: EntityType) -> Result<Option<SyncJob>>;
    async fn list_sync_jobs(&self, limit: i64) -> Result<Vec<SyncJob>>;
}

/// Combined repository trait for all entity types.
pub trait SlateRepository:
    CredentialStore
    + SchoolRepository
    + TermRepository
    + TeacherRepository
    + CourseRepository
    + EmailAddressRepository
    + SyncJobRepository
{
}
