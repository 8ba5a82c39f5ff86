use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::airtable::{AirtableClient, AirtableRecord};
use crate::db::DatabaseBackend;
use crate::error::{Result, VoxError};
use crate::models::{CacheStatus, FeedbackRecord, FieldMap, RefreshSummary, RunType};

/// Orchestrates full and incremental cache refreshes: fetch from upstream,
/// normalize, upsert, commit status. One instance owns the store handle and
/// is shared by the scheduler and the API.
#[derive(Clone)]
pub struct RefreshEngine {
    db: Arc<dyn DatabaseBackend>,
    airtable: AirtableClient,
    // Real mutual exclusion for refresh runs, held from fetch-start to
    // status-commit. The persisted `running` flag only reports state.
    run_lock: Arc<Mutex<()>>,
}

impl RefreshEngine {
    pub fn new(db: Arc<dyn DatabaseBackend>, airtable: AirtableClient) -> Self {
        Self {
            db,
            airtable,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Full refresh of the whole in-scope upstream dataset. Waits for any
    /// in-flight refresh to finish first.
    pub async fn refresh_full(&self) -> Result<RefreshSummary> {
        let _guard = self.run_lock.lock().await;
        self.run(RunType::Full, None).await
    }

    /// Incremental refresh bounded to records changed since `since`, which
    /// defaults to the last completed refresh. Waits for any in-flight
    /// refresh to finish first.
    pub async fn refresh_incremental(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<RefreshSummary> {
        let _guard = self.run_lock.lock().await;
        self.run(RunType::Incremental, since).await
    }

    /// Manual-trigger variant: fails immediately with `RefreshBusy` when a
    /// refresh is already running instead of queueing behind it.
    pub async fn try_refresh(&self, mode: RunType) -> Result<RefreshSummary> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            return Err(VoxError::RefreshBusy);
        };
        self.run(mode, None).await
    }

    pub async fn get_status(&self) -> Result<CacheStatus> {
        self.db.get_cache_status().await
    }

    /// Destructive wipe: deletes every cached record and resets the status
    /// row. Waits for any in-flight refresh so a run never commits on top of
    /// a half-wiped store.
    pub async fn invalidate(&self) -> Result<u64> {
        let _guard = self.run_lock.lock().await;
        let deleted = self.db.delete_all_feedback().await?;
        self.db.reset_cache_status().await?;
        warn!(deleted, "Cache invalidated");
        Ok(deleted)
    }

    async fn run(&self, mode: RunType, since: Option<DateTime<Utc>>) -> Result<RefreshSummary> {
        let since = match mode {
            RunType::Full => None,
            RunType::Incremental => match since {
                Some(ts) => Some(ts),
                None => {
                    let watermark = self.db.get_cache_status().await?.last_update;
                    if watermark.is_none() {
                        info!("No refresh watermark yet, incremental run fetches the full scope");
                    }
                    watermark
                }
            },
        };

        self.db.mark_refresh_started(mode).await?;
        info!(mode = %mode, since = ?since, "Starting cache refresh");

        match self.ingest(since).await {
            Ok(ingested) => {
                let total = self.db.count_feedback().await?;
                self.db.mark_refresh_succeeded(Utc::now(), total).await?;
                info!(mode = %mode, ingested, total, "Cache refresh complete");
                Ok(RefreshSummary { total, mode })
            }
            Err(error) => {
                // Best effort: the original error is what callers need to see
                // even if the status write fails too.
                if let Err(status_error) = self.db.mark_refresh_failed(&error.to_string()).await {
                    warn!(error = %status_error, "Failed to record refresh error");
                }
                Err(error)
            }
        }
    }

    /// Fetches the scoped records and upserts them one by one, normalizing
    /// each payload exactly once.
    async fn ingest(&self, since: Option<DateTime<Utc>>) -> Result<u64> {
        let records = self.airtable.fetch_records(since).await?;

        let mut ingested = 0u64;
        for record in records {
            self.db.upsert_feedback(&to_feedback(record)).await?;
            ingested += 1;
        }
        Ok(ingested)
    }
}

fn to_feedback(record: AirtableRecord) -> FeedbackRecord {
    let modified_at = record.modified_time();
    FeedbackRecord {
        id: record.id,
        created_at: record.created_time,
        modified_at,
        fields: FieldMap::normalize(&record.fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Map, Value};

    fn raw_fields(entries: &[(&str, Value)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_to_feedback_normalizes_payload_once() {
        let record = AirtableRecord {
            id: "rec1".to_string(),
            created_time: Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap(),
            fields: raw_fields(&[
                ("Initial Description", json!(["Login page broken"])),
                ("Priority", json!(1)),
            ]),
        };

        let feedback = to_feedback(record);
        assert_eq!(
            feedback.fields.str_field("initial_description"),
            Some("Login page broken")
        );
        assert_eq!(feedback.fields.priority_label(), "High");
    }

    #[test]
    fn test_to_feedback_modified_falls_back_to_created() {
        let created = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
        let record = AirtableRecord {
            id: "rec1".to_string(),
            created_time: created,
            fields: Map::new(),
        };

        let feedback = to_feedback(record);
        assert_eq!(feedback.modified_at, created);
    }
}
