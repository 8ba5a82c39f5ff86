use crate::db::connection::Database;
use crate::db::repository::{FeedbackRepository, StatusRepository, TicketRepository};
use crate::db::traits::{DatabaseBackend, FeedbackStore, StatusStore, TicketStore};
use crate::error::Result;
use crate::models::{CacheStatus, FeedbackRecord, ReferenceTicket, RunType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Store implementation over the embedded libsql database.
///
/// Each call checks out a fresh connection from the shared handle.
pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn conn(&self) -> Result<libsql::Connection> {
        self.db.connect()
    }
}

#[async_trait]
impl FeedbackStore for LibSqlBackend {
    async fn upsert_feedback(&self, record: &FeedbackRecord) -> Result<()> {
        FeedbackRepository::upsert(&self.conn()?, record).await
    }

    async fn get_feedback(&self, id: &str) -> Result<Option<FeedbackRecord>> {
        FeedbackRepository::get_by_id(&self.conn()?, id).await
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        FeedbackRepository::list(&self.conn()?).await
    }

    async fn count_feedback(&self) -> Result<u64> {
        FeedbackRepository::count(&self.conn()?).await
    }

    async fn list_unrouted_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        FeedbackRepository::list_unrouted(&self.conn()?).await
    }

    async fn set_feedback_team(&self, id: &str, team: &str) -> Result<()> {
        FeedbackRepository::set_team(&self.conn()?, id, team).await
    }

    async fn delete_all_feedback(&self) -> Result<u64> {
        FeedbackRepository::delete_all(&self.conn()?).await
    }
}

#[async_trait]
impl StatusStore for LibSqlBackend {
    async fn get_cache_status(&self) -> Result<CacheStatus> {
        StatusRepository::get(&self.conn()?).await
    }

    async fn mark_refresh_started(&self, run_type: RunType) -> Result<()> {
        StatusRepository::mark_started(&self.conn()?, run_type).await
    }

    async fn mark_refresh_succeeded(
        &self,
        completed_at: DateTime<Utc>,
        total_records: u64,
    ) -> Result<()> {
        StatusRepository::mark_succeeded(&self.conn()?, completed_at, total_records).await
    }

    async fn mark_refresh_failed(&self, message: &str) -> Result<()> {
        StatusRepository::mark_failed(&self.conn()?, message).await
    }

    async fn reset_cache_status(&self) -> Result<()> {
        StatusRepository::reset(&self.conn()?).await
    }
}

#[async_trait]
impl TicketStore for LibSqlBackend {
    async fn upsert_tickets(&self, tickets: &[ReferenceTicket]) -> Result<u64> {
        TicketRepository::upsert_batch(&self.conn()?, tickets).await
    }

    async fn list_routed_tickets(&self) -> Result<Vec<ReferenceTicket>> {
        TicketRepository::list_routed(&self.conn()?).await
    }

    async fn list_tickets(&self) -> Result<Vec<ReferenceTicket>> {
        TicketRepository::list_all(&self.conn()?).await
    }

    async fn list_unvectorized_tickets(&self) -> Result<Vec<ReferenceTicket>> {
        TicketRepository::list_unvectorized(&self.conn()?).await
    }

    async fn set_ticket_embedding(&self, id: &str, embedding: &[f32]) -> Result<()> {
        TicketRepository::set_embedding(&self.conn()?, id, embedding).await
    }

    async fn clear_ticket_embeddings(&self) -> Result<u64> {
        TicketRepository::clear_embeddings(&self.conn()?).await
    }

    async fn count_tickets(&self) -> Result<(u64, u64)> {
        TicketRepository::counts(&self.conn()?).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}
