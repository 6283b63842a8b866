use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::SyncSettings;
use crate::connectors::powerschool::{PaginatedCollector, RawRecord, RecordTransformer};
use crate::db::repository::SlateRepository;
use crate::error::Result;
use crate::models::{
    course::NewCourse, email::NewEmailAddress, school::NewSchool, sync::EntityType,
    teacher::NewTeacher, term::NewTerm,
};

use super::term_resolver::resolve_current;

/// How one entity type is fetched, normalized and stored.
#[async_trait]
pub trait EntitySync<R: SlateRepository>: Send + Sync {
    type Record: Serialize + Send + Sync;

    fn entity_type(&self) -> EntityType;

    async fn fetch(
        &self,
        repo: &R,
        collector: &mut PaginatedCollector<'_, R>,
        settings: &SyncSettings,
    ) -> Result<Vec<RawRecord>>;

    fn transform(&self, raw: &RawRecord) -> Result<Self::Record>;

    /// Store the whole batch in one transaction.
    async fn persist(&self, repo: &R, records: &[Self::Record]) -> Result<()>;
}

pub struct SchoolSync;

#[async_trait]
impl<R: SlateRepository> EntitySync<R> for SchoolSync {
    type Record = NewSchool;

    fn entity_type(&self) -> EntityType {
        EntityType::Schools
    }

    async fn fetch(
        &self,
        _repo: &R,
        collector: &mut PaginatedCollector<'_, R>,
        settings: &SyncSettings,
    ) -> Result<Vec<RawRecord>> {
        collector
            .fetch_once(&settings.queries.schools, &json!({}))
            .await
    }

    fn transform(&self, raw: &RawRecord) -> Result<NewSchool> {
        RecordTransformer::school(raw)
    }

    async fn persist(&self, repo: &R, records: &[NewSchool]) -> Result<()> {
        repo.upsert_schools(records).await
    }
}

/// Terms are queried per locally synced school, then the current term is resolved.
#[derive(Default)]
pub struct TermSync {
    today: Option<NaiveDate>,
}

impl TermSync {
    /// Resolve the current term against a fixed date instead of today.
    pub fn as_of(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }
}

#[async_trait]
impl<R: SlateRepository> EntitySync<R> for TermSync {
    type Record = NewTerm;

    fn entity_type(&self) -> EntityType {
        EntityType::Terms
    }

    async fn fetch(
        &self,
        repo: &R,
        collector: &mut PaginatedCollector<'_, R>,
        settings: &SyncSettings,
    ) -> Result<Vec<RawRecord>> {
        let schools = repo.list_schools().await?;
        if schools.is_empty() {
            warn!("No schools synced yet, term query has nothing to ask for");
        }

        let mut records = Vec::new();
        for school in &schools {
            let page = collector
                .fetch_once(
                    &settings.queries.terms,
                    &json!({ "schoolid": school.school_number }),
                )
                .await?;
            info!(school_number = school.school_number, count = page.len(), "Fetched terms for school");
            records.extend(page);
        }
        Ok(records)
    }

    fn transform(&self, raw: &RawRecord) -> Result<NewTerm> {
        RecordTransformer::term(raw)
    }

    /// The current term is resolved from this batch and flagged in the same
    /// transaction as the upsert.
    async fn persist(&self, repo: &R, records: &[NewTerm]) -> Result<()> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let current = resolve_current(records, today);
        repo.upsert_terms(records, current).await?;
        match current {
            Some(external_id) => info!(external_id, %today, "Current term set"),
            None => info!("No terms synced, current term left unchanged"),
        }
        Ok(())
    }
}

pub struct TeacherSync;

#[async_trait]
impl<R: SlateRepository> EntitySync<R> for TeacherSync {
    type Record = NewTeacher;

    fn entity_type(&self) -> EntityType {
        EntityType::Teachers
    }

    async fn fetch(
        &self,
        _repo: &R,
        collector: &mut PaginatedCollector<'_, R>,
        settings: &SyncSettings,
    ) -> Result<Vec<RawRecord>> {
        collector
            .fetch_once(&settings.queries.teachers, &json!({}))
            .await
    }

    fn transform(&self, raw: &RawRecord) -> Result<NewTeacher> {
        RecordTransformer::teacher(raw)
    }

    async fn persist(&self, repo: &R, records: &[NewTeacher]) -> Result<()> {
        repo.upsert_teachers(records).await
    }
}

pub struct CourseSync;

#[async_trait]
impl<R: SlateRepository> EntitySync<R> for CourseSync {
    type Record = NewCourse;

    fn entity_type(&self) -> EntityType {
        EntityType::Courses
    }

    async fn fetch(
        &self,
        _repo: &R,
        collector: &mut PaginatedCollector<'_, R>,
        settings: &SyncSettings,
    ) -> Result<Vec<RawRecord>> {
        collector
            .fetch_once(&settings.queries.courses, &json!({}))
            .await
    }

    fn transform(&self, raw: &RawRecord) -> Result<NewCourse> {
        RecordTransformer::course(raw)
    }

    async fn persist(&self, repo: &R, records: &[NewCourse]) -> Result<()> {
        repo.upsert_courses(records).await
    }
}

/// Contact email addresses; the only paginated query.
pub struct ContactSync;

#[async_trait]
impl<R: SlateRepository> EntitySync<R> for ContactSync {
    type Record = NewEmailAddress;

    fn entity_type(&self) -> EntityType {
        EntityType::Contacts
    }

    async fn fetch(
        &self,
        _repo: &R,
        collector: &mut PaginatedCollector<'_, R>,
        settings: &SyncSettings,
    ) -> Result<Vec<RawRecord>> {
        collector
            .collect(&settings.queries.contacts, settings.page_size)
            .await
    }

    fn transform(&self, raw: &RawRecord) -> Result<NewEmailAddress> {
        RecordTransformer::email_address(raw)
    }

    async fn persist(&self, repo: &R, records: &[NewEmailAddress]) -> Result<()> {
        repo.upsert_email_addresses(records).await
    }
}
