use tracing::{debug, info, warn};

use crate::db::repository::SyncJobRepository;
use crate::error::{Result, SlateError};
use crate::models::sync::{EntityType, SyncJob, SyncStatus};

/// A job that has been started and not yet finished.
///
/// Finishing consumes the handle, so a job completes or fails at most once.
#[derive(Debug)]
#[must_use = "a running job must be completed or failed"]
pub struct RunningJob {
    id: i64,
    entity_type: EntityType,
}

/// Append-only record of sync attempts: `pending → running → completed | failed`.
pub struct SyncLedger<'a, R: SyncJobRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: SyncJobRepository + ?Sized> SyncLedger<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn create(&self, entity_type: EntityType) -> Result<SyncJob> {
        let job = self.repo.create_sync_job(entity_type).await?;
        debug!(job_id = job.id, entity = %entity_type, "Created sync job");
        Ok(job)
    }

    pub async fn start(&self, job: &SyncJob) -> Result<RunningJob> {
        if !self.repo.mark_sync_job_running(job.id).await? {
            return Err(SlateError::Ledger(format!(
                "sync job {} cannot start: not pending",
                job.id
            )));
        }
        info!(job_id = job.id, entity = %job.entity_type, "Sync job started");
        Ok(RunningJob {
            id: job.id,
            entity_type: job.entity_type,
        })
    }

    pub async fn complete(
        &self,
        job: RunningJob,
        record_count: usize,
        summary: serde_json::Value,
    ) -> Result<SyncJob> {
        let count = i64::try_from(record_count).unwrap_or(i64::MAX);
        self.finish(job, SyncStatus::Completed, count, Some(&summary), None)
            .await
    }

    pub async fn fail(&self, job: RunningJob, message: &str) -> Result<SyncJob> {
        let message = if message.trim().is_empty() {
            "sync failed"
        } else {
            message
        };
        self.finish(job, SyncStatus::Failed, 0, None, Some(message))
            .await
    }

    async fn finish(
        &self,
        job: RunningJob,
        status: SyncStatus,
        record_count: i64,
        summary: Option<&serde_json::Value>,
        error_message: Option<&str>,
    ) -> Result<SyncJob> {
        let finished = self
            .repo
            .finish_sync_job(job.id, status, record_count, summary, error_message)
            .await?;
        let Some(finished) = finished else {
            warn!(job_id = job.id, "Sync job was not running when finished");
            return Err(SlateError::Ledger(format!(
                "sync job {} is not running",
                job.id
            )));
        };

        info!(job_id = job.id, entity = %job.entity_type, status = ?status, record_count, "Sync job finished");
        Ok(finished)
    }

    pub async fn get(&self, id: i64) -> Result<Option<SyncJob>> {
        self.repo.get_sync_job(id).await
    }

    /// Most recent jobs first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<SyncJob>> {
        self.repo.list_sync_jobs(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteRepository;
    use crate::db::DatabasePool;

    async fn setup_repo() -> SqliteRepository {
        let pool = DatabasePool::new_sqlite_memory().await.unwrap();
        match pool {
            DatabasePool::Sqlite(p) => SqliteRepository::new(p),
        }
    }

    #[tokio::test]
    async fn complete_records_count_and_summary() {
        let repo = setup_repo().await;
        let ledger = SyncLedger::new(&repo);

        let job = ledger.create(EntityType::Schools).await.unwrap();
        assert_eq!(job.status, SyncStatus::Pending);

        let running = ledger.start(&job).await.unwrap();
        assert_eq!(running.id, job.id);

        let done = ledger
            .complete(running, 2, serde_json::json!({"count": 2}))
            .await
            .unwrap();
        assert_eq!(done.status, SyncStatus::Completed);
        assert_eq!(done.record_count, 2);
        assert!(done.started_at.is_some());
        assert!(done.completed_at.is_some());
        assert!(done.error_message.is_none());
    }

    #[tokio::test]
    async fn fail_records_message() {
        let repo = setup_repo().await;
        let ledger = SyncLedger::new(&repo);

        let job = ledger.create(EntityType::Terms).await.unwrap();
        let running = ledger.start(&job).await.unwrap();
        let failed = ledger.fail(running, "upstream said no").await.unwrap();

        assert_eq!(failed.status, SyncStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("upstream said no"));
    }

    #[tokio::test]
    async fn blank_failure_message_is_replaced() {
        let repo = setup_repo().await;
        let ledger = SyncLedger::new(&repo);

        let job = ledger.create(EntityType::Terms).await.unwrap();
        let running = ledger.start(&job).await.unwrap();
        let failed = ledger.fail(running, "  ").await.unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("sync failed"));
    }

    #[tokio::test]
    async fn job_starts_only_once() {
        let repo = setup_repo().await;
        let ledger = SyncLedger::new(&repo);

        let job = ledger.create(EntityType::Courses).await.unwrap();
        let running = ledger.start(&job).await.unwrap();
        let err = ledger.start(&job).await.unwrap_err();
        assert!(matches!(err, SlateError::Ledger(_)));

        ledger.fail(running, "cleanup").await.unwrap();
    }

    #[tokio::test]
    async fn terminal_job_rejects_second_finish() {
        let repo = setup_repo().await;
        let ledger = SyncLedger::new(&repo);

        let job = ledger.create(EntityType::Courses).await.unwrap();
        let running = ledger.start(&job).await.unwrap();
        ledger
            .complete(running, 0, serde_json::json!({}))
            .await
            .unwrap();

        // A forged handle for the same row must not flip it to failed.
        let forged = RunningJob {
            id: job.id,
            entity_type: job.entity_type,
        };
        let err = ledger.fail(forged, "late").await.unwrap_err();
        assert!(matches!(err, SlateError::Ledger(_)));
        assert_eq!(
            ledger.get(job.id).await.unwrap().unwrap().status,
            SyncStatus::Completed
        );
    }

    #[tokio::test]
    async fn recent_lists_newest_first() {
        let repo = setup_repo().await;
        let ledger = SyncLedger::new(&repo);

        let first = ledger.create(EntityType::Schools).await.unwrap();
        let second = ledger.create(EntityType::Teachers).await.unwrap();

        let recent = ledger.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, second.id);
        assert_eq!(recent[1].id, first.id);
    }
}
