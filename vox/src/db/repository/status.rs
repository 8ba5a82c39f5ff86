use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{CacheStatus, RunType};

/// Reads and writes the singleton `cache_status` row (id = 1). The row is
/// seeded by schema init, so every method assumes it exists.
pub struct StatusRepository;

impl StatusRepository {
    pub async fn get(conn: &Connection) -> Result<CacheStatus> {
        let mut rows = conn
            .query(
                "SELECT last_update, total_records, last_error, last_run_type, running
                 FROM cache_status WHERE id = 1",
                (),
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(CacheStatus {
                last_update: row
                    .get::<Option<String>>(0)?
                    .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
                total_records: row.get::<i64>(1)? as u64,
                last_error: row.get(2)?,
                last_run_type: row
                    .get::<Option<String>>(3)?
                    .and_then(|s| s.parse::<RunType>().ok()),
                running: row.get::<i32>(4)? != 0,
            })
        } else {
            Ok(CacheStatus::default())
        }
    }

    pub async fn mark_started(conn: &Connection, run_type: RunType) -> Result<()> {
        conn.execute(
            "UPDATE cache_status
             SET running = 1, last_run_type = ?1, last_error = NULL
             WHERE id = 1",
            params![run_type.to_string()],
        )
        .await?;
        Ok(())
    }

    pub async fn mark_succeeded(
        conn: &Connection,
        completed_at: DateTime<Utc>,
        total_records: u64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE cache_status
             SET last_update = ?1, total_records = ?2, last_error = NULL, running = 0
             WHERE id = 1",
            params![completed_at.to_rfc3339(), total_records as i64],
        )
        .await?;
        Ok(())
    }

    pub async fn mark_failed(conn: &Connection, message: &str) -> Result<()> {
        conn.execute(
            "UPDATE cache_status SET last_error = ?1, running = 0 WHERE id = 1",
            params![message],
        )
        .await?;
        Ok(())
    }

    pub async fn reset(conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE cache_status
             SET last_update = NULL, total_records = 0, last_error = NULL,
                 last_run_type = NULL, running = 0
             WHERE id = 1",
            (),
        )
        .await?;
        Ok(())
    }
}
