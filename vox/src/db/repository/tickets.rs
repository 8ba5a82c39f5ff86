use libsql::{params, Connection};

use crate::error::Result;
use crate::models::ReferenceTicket;

pub struct TicketRepository;

impl TicketRepository {
    /// Batch insert-or-update keyed on ticket id. The embedding column is
    /// deliberately absent from the UPDATE set: re-importing a corpus must
    /// not discard embeddings that were already computed.
    pub async fn upsert_batch(conn: &Connection, tickets: &[ReferenceTicket]) -> Result<u64> {
        let mut written = 0u64;
        for ticket in tickets {
            conn.execute(
                r#"
                INSERT INTO reference_tickets (
                    id, summary, description, resolution, assignee, team_name
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    summary = excluded.summary,
                    description = excluded.description,
                    resolution = excluded.resolution,
                    assignee = excluded.assignee,
                    team_name = excluded.team_name
                "#,
                params![
                    ticket.id.clone(),
                    ticket.summary.clone(),
                    ticket.description.clone(),
                    ticket.resolution.clone(),
                    ticket.assignee.clone(),
                    ticket.team_name.clone(),
                ],
            )
            .await?;
            written += 1;
        }
        Ok(written)
    }

    /// Tickets carrying a team label, used as routing evidence.
    pub async fn list_routed(conn: &Connection) -> Result<Vec<ReferenceTicket>> {
        let mut rows = conn
            .query(
                "SELECT id, summary, description, resolution, assignee, team_name, embedding
                 FROM reference_tickets WHERE team_name != ''",
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_ticket(&row)?);
        }
        Ok(results)
    }

    pub async fn list_all(conn: &Connection) -> Result<Vec<ReferenceTicket>> {
        let mut rows = conn
            .query(
                "SELECT id, summary, description, resolution, assignee, team_name, embedding
                 FROM reference_tickets",
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_ticket(&row)?);
        }
        Ok(results)
    }

    /// Tickets still waiting for an embedding. Tickets with no usable text
    /// are excluded; they can never be vectorized.
    pub async fn list_unvectorized(conn: &Connection) -> Result<Vec<ReferenceTicket>> {
        let mut rows = conn
            .query(
                "SELECT id, summary, description, resolution, assignee, team_name, embedding
                 FROM reference_tickets
                 WHERE (embedding IS NULL OR embedding = '')
                   AND TRIM(summary || ' ' || description) != ''",
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_ticket(&row)?);
        }
        Ok(results)
    }

    pub async fn set_embedding(conn: &Connection, id: &str, embedding: &[f32]) -> Result<()> {
        conn.execute(
            "UPDATE reference_tickets SET embedding = ?2 WHERE id = ?1",
            params![id, serde_json::to_string(embedding)?],
        )
        .await?;
        Ok(())
    }

    pub async fn clear_embeddings(conn: &Connection) -> Result<u64> {
        let affected = conn
            .execute(
                "UPDATE reference_tickets SET embedding = NULL WHERE embedding IS NOT NULL",
                (),
            )
            .await?;
        Ok(affected)
    }

    /// Returns `(total, vectorized)` counts.
    pub async fn counts(conn: &Connection) -> Result<(u64, u64)> {
        let mut rows = conn
            .query(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN embedding IS NOT NULL AND embedding != ''
                                          THEN 1 ELSE 0 END), 0)
                 FROM reference_tickets",
                (),
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok((row.get::<i64>(0)? as u64, row.get::<i64>(1)? as u64))
        } else {
            Ok((0, 0))
        }
    }

    fn row_to_ticket(row: &libsql::Row) -> Result<ReferenceTicket> {
        Ok(ReferenceTicket {
            id: row.get(0)?,
            summary: row.get(1)?,
            description: row.get(2)?,
            resolution: row.get(3)?,
            assignee: row.get(4)?,
            team_name: row.get(5)?,
            embedding: row
                .get::<Option<String>>(6)?
                .and_then(|s| serde_json::from_str(&s).ok()),
        })
    }
}
