use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{FeedbackRecord, FieldMap};

pub struct FeedbackRepository;

impl FeedbackRepository {
    /// Insert-or-replace keyed on the upstream record id. Replaying a page of
    /// records that are already cached converges to the same rows.
    pub async fn upsert(conn: &Connection, record: &FeedbackRecord) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO feedback_cache (id, created_at, modified_at, fields_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                created_at = excluded.created_at,
                modified_at = excluded.modified_at,
                fields_json = excluded.fields_json
            "#,
            params![
                record.id.clone(),
                record.created_at.to_rfc3339(),
                record.modified_at.to_rfc3339(),
                record.fields.to_json()?,
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<FeedbackRecord>> {
        let mut rows = conn
            .query(
                "SELECT id, created_at, modified_at, fields_json
                 FROM feedback_cache WHERE id = ?1",
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            match Self::row_to_record(&row) {
                Ok(record) => Ok(Some(record)),
                Err(error) => {
                    tracing::warn!(id = %id, error = %error, "Skipping unreadable feedback row");
                    Ok(None)
                }
            }
        } else {
            Ok(None)
        }
    }

    /// All cached records, newest first. Rows whose payload no longer parses
    /// are skipped with a warning rather than failing the whole read; they
    /// stay in storage until the next refresh rewrites them.
    pub async fn list(conn: &Connection) -> Result<Vec<FeedbackRecord>> {
        let mut rows = conn
            .query(
                "SELECT id, created_at, modified_at, fields_json
                 FROM feedback_cache ORDER BY created_at DESC",
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            match Self::row_to_record(&row) {
                Ok(record) => results.push(record),
                Err(error) => {
                    let id: String = row.get(0).unwrap_or_default();
                    tracing::warn!(id = %id, error = %error, "Skipping unreadable feedback row");
                }
            }
        }
        Ok(results)
    }

    pub async fn count(conn: &Connection) -> Result<u64> {
        let mut rows = conn
            .query("SELECT COUNT(*) FROM feedback_cache", ())
            .await?;
        if let Some(row) = rows.next().await? {
            Ok(row.get::<i64>(0)? as u64)
        } else {
            Ok(0)
        }
    }

    /// Records whose payload has no routed team yet.
    pub async fn list_unrouted(conn: &Connection) -> Result<Vec<FeedbackRecord>> {
        let mut rows = conn
            .query(
                "SELECT id, created_at, modified_at, fields_json
                 FROM feedback_cache
                 WHERE COALESCE(json_extract(fields_json, '$.team_routed'), '')
                       IN ('', 'Unassigned')
                 ORDER BY created_at DESC",
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            match Self::row_to_record(&row) {
                Ok(record) => results.push(record),
                Err(error) => {
                    let id: String = row.get(0).unwrap_or_default();
                    tracing::warn!(id = %id, error = %error, "Skipping unreadable feedback row");
                }
            }
        }
        Ok(results)
    }

    pub async fn set_team(conn: &Connection, id: &str, team: &str) -> Result<()> {
        conn.execute(
            "UPDATE feedback_cache
             SET fields_json = json_set(fields_json, '$.team_routed', ?2)
             WHERE id = ?1",
            params![id, team],
        )
        .await?;
        Ok(())
    }

    pub async fn delete_all(conn: &Connection) -> Result<u64> {
        let deleted = conn.execute("DELETE FROM feedback_cache", ()).await?;
        Ok(deleted)
    }

    fn row_to_record(row: &libsql::Row) -> Result<FeedbackRecord> {
        Ok(FeedbackRecord {
            id: row.get(0)?,
            created_at: DateTime::parse_from_rfc3339(&row.get::<String>(1)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            modified_at: DateTime::parse_from_rfc3339(&row.get::<String>(2)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            fields: FieldMap::from_json(&row.get::<String>(3)?)?,
        })
    }
}
