//! Sync engine: runs one entity sync end to end and records it in the ledger.

pub mod entities;
pub mod ledger;
pub mod term_resolver;

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{error, info, warn};

use crate::config::SyncSettings;
use crate::connectors::powerschool::{PaginatedCollector, PowerSchoolClient, TokenManager};
use crate::db::repository::SlateRepository;
use crate::error::{Result, SlateError};
use crate::models::sync::{EntityType, SyncResult};

use self::entities::{ContactSync, CourseSync, EntitySync, SchoolSync, TeacherSync, TermSync};
use self::ledger::SyncLedger;

/// Records kept from a persisted batch for the preview and the ledger summary.
struct Batch {
    count: usize,
    head: Vec<serde_json::Value>,
}

/// Runs a single entity sync: pre-flight checks, then a ledger-tracked pipeline.
pub struct SyncOrchestrator<'a, R: SlateRepository, E: EntitySync<R>> {
    repo: &'a R,
    entity: E,
    settings: &'a SyncSettings,
}

impl<'a, R: SlateRepository, E: EntitySync<R>> SyncOrchestrator<'a, R, E> {
    pub fn new(repo: &'a R, entity: E, settings: &'a SyncSettings) -> Self {
        Self {
            repo,
            entity,
            settings,
        }
    }

    /// Run the sync.
    ///
    /// Incomplete credentials and token failures return before any job is
    /// created. Once a job exists, every error marks it failed before it is
    /// returned.
    pub async fn run(&self) -> Result<SyncResult> {
        let started = Instant::now();
        let entity = self.entity.entity_type();

        let credential = self.repo.get_credential().await?;
        let missing = credential.missing_fields();
        if !missing.is_empty() {
            warn!(entity = %entity, missing = ?missing, "Upstream credentials incomplete, sync not started");
            return Err(SlateError::ConfigIncomplete(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        let client = PowerSchoolClient::new(
            &credential.endpoint,
            Duration::from_secs(self.settings.request_timeout_secs),
        )?;
        let tokens = TokenManager::new(&client, self.repo, self.settings.token_expiry_skew_secs);
        let token = tokens.ensure_valid_token().await?;

        let ledger = SyncLedger::new(self.repo);
        let job = ledger.create(entity).await?;
        let running = ledger.start(&job).await?;
        info!(entity = %entity, job_id = job.id, "Starting sync");

        let mut collector = PaginatedCollector::new(&client, &tokens, token);
        match self.execute(&mut collector).await {
            Ok(batch) => {
                let summary_len = batch.head.len().min(self.settings.summary_limit);
                let summary = json!({
                    "count": batch.count,
                    "records": &batch.head[..summary_len],
                    "truncated": batch.count > summary_len,
                    "tokenRefreshes": collector.refreshes(),
                });
                ledger.complete(running, batch.count, summary).await?;

                let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                info!(entity = %entity, job_id = job.id, count = batch.count, duration_ms, "Sync completed");

                let mut preview = batch.head;
                preview.truncate(self.settings.preview_limit);
                Ok(SyncResult {
                    success: true,
                    entity,
                    job_id: job.id,
                    count: batch.count,
                    duration_ms,
                    preview,
                })
            }
            Err(e) => {
                error!(entity = %entity, job_id = job.id, error = %e, "Sync failed");
                if let Err(mark_err) = ledger.fail(running, &e.to_string()).await {
                    error!(job_id = job.id, error = %mark_err, "Could not mark sync job failed");
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, collector: &mut PaginatedCollector<'_, R>) -> Result<Batch> {
        let raw = self.entity.fetch(self.repo, collector, self.settings).await?;
        let records = raw
            .iter()
            .map(|r| self.entity.transform(r))
            .collect::<Result<Vec<_>>>()?;

        self.entity.persist(self.repo, &records).await?;

        let keep = self.settings.preview_limit.max(self.settings.summary_limit);
        let head = records
            .iter()
            .take(keep)
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Batch {
            count: records.len(),
            head,
        })
    }
}

/// Sync one entity type.
pub async fn sync_entity<R: SlateRepository>(
    repo: &R,
    entity: EntityType,
    settings: &SyncSettings,
) -> Result<SyncResult> {
    match entity {
        EntityType::Schools => SyncOrchestrator::new(repo, SchoolSync, settings).run().await,
        EntityType::Terms => {
            SyncOrchestrator::new(repo, TermSync::default(), settings)
                .run()
                .await
        }
        EntityType::Teachers => SyncOrchestrator::new(repo, TeacherSync, settings).run().await,
        EntityType::Courses => SyncOrchestrator::new(repo, CourseSync, settings).run().await,
        EntityType::Contacts => SyncOrchestrator::new(repo, ContactSync, settings).run().await,
    }
}

/// Sync every entity type in dependency order, stopping at the first failure.
pub async fn sync_all<R: SlateRepository>(
    repo: &R,
    settings: &SyncSettings,
) -> Result<Vec<SyncResult>> {
    let mut results = Vec::with_capacity(EntityType::ALL.len());
    for entity in EntityType::ALL {
        results.push(sync_entity(repo, entity, settings).await?);
    }
    Ok(results)
}
