use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CacheStatus, FeedbackRecord, ReferenceTicket, RunType};

/// Storage operations for cached feedback records.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Inserts the record, or replaces timestamps and payload when the id
    /// already exists.
    async fn upsert_feedback(&self, record: &FeedbackRecord) -> Result<()>;

    async fn get_feedback(&self, id: &str) -> Result<Option<FeedbackRecord>>;

    /// All cached records, newest first.
    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>>;

    async fn count_feedback(&self) -> Result<u64>;

    /// Records with no team routed yet (missing, empty, or "Unassigned").
    async fn list_unrouted_feedback(&self) -> Result<Vec<FeedbackRecord>>;

    /// Writes the routed team into the record's payload.
    async fn set_feedback_team(&self, id: &str, team: &str) -> Result<()>;

    /// Drops every cached record. Returns how many rows were deleted.
    async fn delete_all_feedback(&self) -> Result<u64>;
}

/// Storage operations for the singleton refresh status row.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn get_cache_status(&self) -> Result<CacheStatus>;

    /// Marks a refresh as in progress and clears the previous error.
    async fn mark_refresh_started(&self, run_type: RunType) -> Result<()>;

    /// Records a completed refresh: watermark, record count, flag cleared.
    async fn mark_refresh_succeeded(
        &self,
        completed_at: DateTime<Utc>,
        total_records: u64,
    ) -> Result<()>;

    /// Records a failed refresh. The previous watermark is left untouched so
    /// the next incremental run re-covers the failed window.
    async fn mark_refresh_failed(&self, message: &str) -> Result<()>;

    /// Returns the status row to its initial state.
    async fn reset_cache_status(&self) -> Result<()>;
}

/// Storage operations for the reference ticket corpus used in team routing.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Inserts or updates tickets by id. Stored embeddings are preserved on
    /// update; re-importing a corpus never discards vectorization work.
    async fn upsert_tickets(&self, tickets: &[ReferenceTicket]) -> Result<u64>;

    /// Tickets that carry a team label, with embeddings when present.
    async fn list_routed_tickets(&self) -> Result<Vec<ReferenceTicket>>;

    /// All tickets, for retrieval that does not need a team label.
    async fn list_tickets(&self) -> Result<Vec<ReferenceTicket>>;

    /// Tickets with no stored embedding and non-empty matching text.
    async fn list_unvectorized_tickets(&self) -> Result<Vec<ReferenceTicket>>;

    async fn set_ticket_embedding(&self, id: &str, embedding: &[f32]) -> Result<()>;

    /// Clears all stored embeddings. Returns how many rows were affected.
    async fn clear_ticket_embeddings(&self) -> Result<u64>;

    /// Returns `(total, vectorized)` ticket counts.
    async fn count_tickets(&self) -> Result<(u64, u64)>;
}

/// Combined backend interface the rest of the application depends on.
#[async_trait]
pub trait DatabaseBackend: FeedbackStore + StatusStore + TicketStore {
    /// Syncs with the remote database when replication is configured.
    async fn sync(&self) -> Result<()>;
}
