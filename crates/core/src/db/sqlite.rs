use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{Result, SlateError};
use crate::models::{
    course::{Course, NewCourse},
    credential::Credential,
    email::{EmailAddress, NewEmailAddress},
    school::{NewSchool, School},
    sync::{EntityType, SyncJob, SyncStatus},
    teacher::{NewTeacher, Teacher},
    term::{NewTerm, Term},
};

use super::repository::{
    CourseRepository, CredentialStore, EmailAddressRepository, SchoolRepository, SlateRepository,
    SyncJobRepository, TeacherRepository, TermRepository,
};

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SlateRepository for SqliteRepository {}

// -- Helper functions for parsing values from DB strings --

fn parse_sync_status(s: &str) -> Result<SyncStatus> {
    match s {
        "pending" => Ok(SyncStatus::Pending),
        "running" => Ok(SyncStatus::Running),
        "completed" => Ok(SyncStatus::Completed),
        "failed" => Ok(SyncStatus::Failed),
        other => Err(SlateError::Serialization(format!(
            "unknown sync status '{other}' in sync_jobs"
        ))),
    }
}

fn sync_status_to_str(s: &SyncStatus) -> &'static str {
    match s {
        SyncStatus::Pending => "pending",
        SyncStatus::Running => "running",
        SyncStatus::Completed => "completed",
        SyncStatus::Failed => "failed",
    }
}

fn parse_entity_type(s: &str) -> Result<EntityType> {
    s.parse()
        .map_err(|e: String| SlateError::Serialization(format!("{e} in sync_jobs")))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn datetime_to_str(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_naive_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| SlateError::Serialization(format!("invalid stored date '{s}': {e}")))
}

fn naive_date_to_str(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn parse_summary(s: Option<String>) -> Option<serde_json::Value> {
    s.and_then(|v| serde_json::from_str(&v).ok())
}

// -- Row mappers --

const SCHOOL_COLUMNS: &str = "id, external_id, name, school_number";

fn row_to_school(r: &SqliteRow) -> School {
    School {
        id: r.get("id"),
        external_id: r.get("external_id"),
        name: r.get("name"),
        school_number: r.get("school_number"),
    }
}

const TERM_COLUMNS: &str = "id, external_id, name, abbreviation, first_day, last_day, year_id, is_year_record, is_current, school_id";

fn row_to_term(r: &SqliteRow) -> Result<Term> {
    Ok(Term {
        id: r.get("id"),
        external_id: r.get("external_id"),
        name: r.get("name"),
        abbreviation: r.get("abbreviation"),
        first_day: parse_naive_date(r.get("first_day"))?,
        last_day: parse_naive_date(r.get("last_day"))?,
        year_id: r.get("year_id"),
        is_year_record: r.get("is_year_record"),
        is_current: r.get("is_current"),
        school_id: r.get("school_id"),
    })
}

const TEACHER_COLUMNS: &str = "id, external_id, external_dcid, first_name, last_name, display_name, email, staff_status, is_active, school_id";

fn row_to_teacher(r: &SqliteRow) -> Teacher {
    Teacher {
        id: r.get("id"),
        external_id: r.get("external_id"),
        external_dcid: r.get("external_dcid"),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        display_name: r.get("display_name"),
        email: r.get("email"),
        staff_status: r.get("staff_status"),
        is_active: r.get("is_active"),
        school_id: r.get("school_id"),
    }
}

const COURSE_COLUMNS: &str =
    "id, external_id, external_dcid, course_number, course_name, credit_hours, is_active";

fn row_to_course(r: &SqliteRow) -> Course {
    Course {
        id: r.get("id"),
        external_id: r.get("external_id"),
        external_dcid: r.get("external_dcid"),
        course_number: r.get("course_number"),
        course_name: r.get("course_name"),
        credit_hours: r.get("credit_hours"),
        is_active: r.get("is_active"),
    }
}

fn row_to_email_address(r: &SqliteRow) -> EmailAddress {
    EmailAddress {
        id: r.get("id"),
        external_id: r.get("external_id"),
        email_address: r.get("email_address"),
    }
}

const SYNC_JOB_COLUMNS: &str = "id, entity_type, status, started_at, completed_at, record_count, result_summary, error_message";

fn row_to_sync_job(r: &SqliteRow) -> Result<SyncJob> {
    Ok(SyncJob {
        id: r.get("id"),
        entity_type: parse_entity_type(r.get("entity_type"))?,
        status: parse_sync_status(r.get("status"))?,
        started_at: r
            .get::<Option<String>, _>("started_at")
            .and_then(|s| parse_datetime(&s)),
        completed_at: r
            .get::<Option<String>, _>("completed_at")
            .and_then(|s| parse_datetime(&s)),
        record_count: r.get("record_count"),
        result_summary: parse_summary(r.get("result_summary")),
        error_message: r.get("error_message"),
    })
}

// -- CredentialStore --

#[async_trait]
impl CredentialStore for SqliteRepository {
    async fn get_credential(&self) -> Result<Credential> {
        let row = sqlx::query(
            "SELECT endpoint, client_id, client_secret, access_token, token_expires_at FROM credentials WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(r) => Credential {
                endpoint: r.get("endpoint"),
                client_id: r.get("client_id"),
                client_secret: r.get("client_secret"),
                access_token: r.get("access_token"),
                token_expires_at: r
                    .get::<Option<String>, _>("token_expires_at")
                    .and_then(|s| parse_datetime(&s)),
            },
            None => Credential::default(),
        })
    }

    async fn configure_credential(
        &self,
        endpoint: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO credentials (id, endpoint, client_id, client_secret, access_token, token_expires_at, updated_at)
             VALUES (1, ?1, ?2, ?3, NULL, NULL, ?4)
             ON CONFLICT(id) DO UPDATE SET
                access_token = CASE WHEN credentials.endpoint = excluded.endpoint
                    AND credentials.client_id = excluded.client_id
                    AND credentials.client_secret = excluded.client_secret
                    THEN credentials.access_token ELSE NULL END,
                token_expires_at = CASE WHEN credentials.endpoint = excluded.endpoint
                    AND credentials.client_id = excluded.client_id
                    AND credentials.client_secret = excluded.client_secret
                    THEN credentials.token_expires_at ELSE NULL END,
                endpoint = excluded.endpoint,
                client_id = excluded.client_id,
                client_secret = excluded.client_secret,
                updated_at = excluded.updated_at",
        )
        .bind(endpoint.trim_end_matches('/'))
        .bind(client_id)
        .bind(client_secret)
        .bind(datetime_to_str(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_token(&self, access_token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO credentials (id, access_token, token_expires_at, updated_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                access_token = excluded.access_token,
                token_expires_at = excluded.token_expires_at,
                updated_at = excluded.updated_at",
        )
        .bind(access_token)
        .bind(datetime_to_str(&expires_at))
        .bind(datetime_to_str(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// -- SchoolRepository --

#[async_trait]
impl SchoolRepository for SqliteRepository {
    async fn upsert_schools(&self, schools: &[NewSchool]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for school in schools {
            sqlx::query(
                "INSERT INTO schools (external_id, name, school_number)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(external_id) DO UPDATE SET
                    name = excluded.name,
                    school_number = excluded.school_number",
            )
            .bind(school.external_id)
            .bind(&school.name)
            .bind(school.school_number)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_school_by_external_id(&self, external_id: i64) -> Result<Option<School>> {
        let row = sqlx::query(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE external_id = ?1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_school))
    }

    async fn list_schools(&self) -> Result<Vec<School>> {
        let rows = sqlx::query(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools ORDER BY school_number, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_school).collect())
    }
}

// -- TermRepository --

#[async_trait]
impl TermRepository for SqliteRepository {
    async fn upsert_terms(&self, terms: &[NewTerm], current: Option<i64>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for term in terms {
            // is_current is only changed through `current` below.
            sqlx::query(
                "INSERT INTO terms (external_id, name, abbreviation, first_day, last_day, year_id, is_year_record, school_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, (SELECT id FROM schools WHERE school_number = ?8 ORDER BY id LIMIT 1))
                 ON CONFLICT(external_id) DO UPDATE SET
                    name = excluded.name,
                    abbreviation = excluded.abbreviation,
                    first_day = excluded.first_day,
                    last_day = excluded.last_day,
                    year_id = excluded.year_id,
                    is_year_record = excluded.is_year_record,
                    school_id = excluded.school_id",
            )
            .bind(term.external_id)
            .bind(&term.name)
            .bind(&term.abbreviation)
            .bind(naive_date_to_str(&term.first_day))
            .bind(naive_date_to_str(&term.last_day))
            .bind(term.year_id)
            .bind(term.is_year_record)
            .bind(term.school_number)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(external_id) = current {
            sqlx::query("UPDATE terms SET is_current = 0 WHERE is_current = 1")
                .execute(&mut *tx)
                .await?;
            let result = sqlx::query("UPDATE terms SET is_current = 1 WHERE external_id = ?1")
                .bind(external_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the whole batch.
                return Err(SlateError::NotFound(format!(
                    "term with external id {external_id}"
                )));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_term_by_external_id(&self, external_id: i64) -> Result<Option<Term>> {
        let row = sqlx::query(&format!(
            "SELECT {TERM_COLUMNS} FROM terms WHERE external_id = ?1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_term).transpose()
    }

    async fn list_terms(&self) -> Result<Vec<Term>> {
        let rows = sqlx::query(&format!(
            "SELECT {TERM_COLUMNS} FROM terms ORDER BY first_day, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_term).collect()
    }

    async fn get_current_term(&self) -> Result<Option<Term>> {
        let row = sqlx::query(&format!(
            "SELECT {TERM_COLUMNS} FROM terms WHERE is_current = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_term).transpose()
    }
}

// -- TeacherRepository --

#[async_trait]
impl TeacherRepository for SqliteRepository {
    async fn upsert_teachers(&self, teachers: &[NewTeacher]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for teacher in teachers {
            sqlx::query(
                "INSERT INTO teachers (external_id, external_dcid, first_name, last_name, display_name, email, staff_status, is_active, school_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, (SELECT id FROM schools WHERE school_number = ?9 ORDER BY id LIMIT 1))
                 ON CONFLICT(external_id) DO UPDATE SET
                    external_dcid = excluded.external_dcid,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    display_name = excluded.display_name,
                    email = excluded.email,
                    staff_status = excluded.staff_status,
                    is_active = excluded.is_active,
                    school_id = excluded.school_id",
            )
            .bind(teacher.external_id)
            .bind(teacher.external_dcid)
            .bind(&teacher.first_name)
            .bind(&teacher.last_name)
            .bind(&teacher.display_name)
            .bind(&teacher.email)
            .bind(teacher.staff_status)
            .bind(teacher.is_active)
            .bind(teacher.school_number)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_teacher_by_external_id(&self, external_id: i64) -> Result<Option<Teacher>> {
        let row = sqlx::query(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers WHERE external_id = ?1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_teacher))
    }

    async fn list_teachers(&self) -> Result<Vec<Teacher>> {
        let rows = sqlx::query(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers ORDER BY last_name, first_name, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_teacher).collect())
    }
}

// -- CourseRepository --

#[async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_courses(&self, courses: &[NewCourse]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for course in courses {
            sqlx::query(
                "INSERT INTO courses (external_id, external_dcid, course_number, course_name, credit_hours, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(external_id) DO UPDATE SET
                    external_dcid = excluded.external_dcid,
                    course_number = excluded.course_number,
                    course_name = excluded.course_name,
                    credit_hours = excluded.credit_hours,
                    is_active = excluded.is_active",
            )
            .bind(course.external_id)
            .bind(course.external_dcid)
            .bind(&course.course_number)
            .bind(&course.course_name)
            .bind(course.credit_hours)
            .bind(course.is_active)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_course_by_external_id(&self, external_id: i64) -> Result<Option<Course>> {
        let row = sqlx::query(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE external_id = ?1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_course))
    }

    async fn list_courses(&self) -> Result<Vec<Course>> {
        let rows = sqlx::query(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY course_number, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_course).collect())
    }
}

// -- EmailAddressRepository --

#[async_trait]
impl EmailAddressRepository for SqliteRepository {
    async fn upsert_email_addresses(&self, emails: &[NewEmailAddress]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for email in emails {
            sqlx::query(
                "INSERT INTO email_addresses (external_id, email_address)
                 VALUES (?1, ?2)
                 ON CONFLICT(external_id) DO UPDATE SET
                    email_address = excluded.email_address",
            )
            .bind(email.external_id)
            .bind(&email.email_address)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_email_address_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<EmailAddress>> {
        let row = sqlx::query(
            "SELECT id, external_id, email_address FROM email_addresses WHERE external_id = ?1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_email_address))
    }

    async fn list_email_addresses(&self) -> Result<Vec<EmailAddress>> {
        let rows = sqlx::query(
            "SELECT id, external_id, email_address FROM email_addresses ORDER BY external_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_email_address).collect())
    }
}

// -- SyncJobRepository --

#[async_trait]
impl SyncJobRepository for SqliteRepository {
    async fn create_sync_job(&self, entity_type: EntityType) -> Result<SyncJob> {
        let now = datetime_to_str(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO sync_jobs (entity_type, status, created_at, record_count)
             VALUES (?1, ?2, ?3, 0)",
        )
        .bind(entity_type.as_str())
        .bind(sync_status_to_str(&SyncStatus::Pending))
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(SyncJob {
            id: result.last_insert_rowid(),
            entity_type,
            status: SyncStatus::Pending,
            started_at: None,
            completed_at: None,
            record_count: 0,
            result_summary: None,
            error_message: None,
        })
    }

    async fn mark_sync_job_running(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE sync_jobs SET status = ?1, started_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(sync_status_to_str(&SyncStatus::Running))
        .bind(datetime_to_str(&Utc::now()))
        .bind(id)
        .bind(sync_status_to_str(&SyncStatus::Pending))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn finish_sync_job(
        &self,
        id: i64,
        status: SyncStatus,
        record_count: i64,
        result_summary: Option<&serde_json::Value>,
        error_message: Option<&str>,
    ) -> Result<Option<SyncJob>> {
        let row = sqlx::query(&format!(
            "UPDATE sync_jobs SET status = ?1, completed_at = ?2, record_count = ?3, result_summary = ?4, error_message = ?5
             WHERE id = ?6 AND status = ?7
             RETURNING {SYNC_JOB_COLUMNS}"
        ))
        .bind(sync_status_to_str(&status))
        .bind(datetime_to_str(&Utc::now()))
        .bind(record_count)
        .bind(result_summary.map(|v| v.to_string()))
        .bind(error_message)
        .bind(id)
        .bind(sync_status_to_str(&SyncStatus::Running))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_sync_job).transpose()
    }

    async fn get_sync_job(&self, id: i64) -> Result<Option<SyncJob>> {
        let row = sqlx::query(&format!(
            "SELECT {SYNC_JOB_COLUMNS} FROM sync_jobs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_sync_job).transpose()
    }

    async fn get_latest_sync_job(&self, entity_type: EntityType) -> Result<Option<SyncJob>> {
        let row = sqlx::query(&format!(
            "SELECT {SYNC_JOB_COLUMNS} FROM sync_jobs WHERE entity_type = ?1 ORDER BY id DESC LIMIT 1"
        ))
        .bind(entity_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_sync_job).transpose()
    }

    async fn list_sync_jobs(&self, limit: i64) -> Result<Vec<SyncJob>> {
        let rows = sqlx::query(&format!(
            "SELECT {SYNC_JOB_COLUMNS} FROM sync_jobs ORDER BY id DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_sync_job).collect()
    }
}
