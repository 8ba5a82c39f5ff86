use libsql::Connection;

use crate::error::Result;

/// Creates all tables and indexes, then applies in-place migrations for
/// columns added after the first release. Safe to run on every startup.
pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS feedback_cache (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL,
            fields_json TEXT NOT NULL DEFAULT '{}'
        );

        CREATE INDEX IF NOT EXISTS idx_feedback_cache_created_at
            ON feedback_cache(created_at);

        CREATE INDEX IF NOT EXISTS idx_feedback_cache_modified_at
            ON feedback_cache(modified_at);

        CREATE TABLE IF NOT EXISTS cache_status (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_update TEXT,
            total_records INTEGER NOT NULL DEFAULT 0,
            last_error TEXT,
            last_run_type TEXT,
            running INTEGER NOT NULL DEFAULT 0
        );

        INSERT OR IGNORE INTO cache_status (id) VALUES (1);

        CREATE TABLE IF NOT EXISTS reference_tickets (
            id TEXT PRIMARY KEY,
            summary TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            resolution TEXT NOT NULL DEFAULT '',
            assignee TEXT NOT NULL DEFAULT '',
            team_name TEXT NOT NULL DEFAULT '',
            embedding TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_reference_tickets_team_name
            ON reference_tickets(team_name);
        "#,
    )
    .await?;

    migrate_status_run_type(conn).await?;
    reset_stale_running(conn).await?;

    Ok(())
}

/// Adds the `last_run_type` column to `cache_status` for databases created
/// before refresh kinds were recorded.
async fn migrate_status_run_type(conn: &Connection) -> Result<()> {
    let mut rows = conn
        .query("SELECT name FROM pragma_table_info('cache_status')", ())
        .await?;

    let mut has_run_type = false;
    while let Some(row) = rows.next().await? {
        let name: String = row.get(0)?;
        if name == "last_run_type" {
            has_run_type = true;
            break;
        }
    }

    if !has_run_type {
        tracing::info!("Migrating cache_status: adding last_run_type column");
        conn.execute("ALTER TABLE cache_status ADD COLUMN last_run_type TEXT", ())
            .await?;
    }

    Ok(())
}

/// Clears a `running` flag left behind by a crash mid-refresh. The in-process
/// refresh lock is the real mutual exclusion; the persisted flag only reports
/// state, so a stale flag must not survive a restart.
async fn reset_stale_running(conn: &Connection) -> Result<()> {
    let cleared = conn
        .execute("UPDATE cache_status SET running = 0 WHERE running = 1", ())
        .await?;
    if cleared > 0 {
        tracing::warn!("Cleared stale running flag from previous process");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    #[tokio::test]
    async fn test_init_schema_creates_tables() {
        let conn = memory_conn().await;
        init_schema(&conn).await.unwrap();

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                (),
            )
            .await
            .unwrap();

        let mut tables = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            tables.push(row.get::<String>(0).unwrap());
        }

        assert!(tables.contains(&"feedback_cache".to_string()));
        assert!(tables.contains(&"cache_status".to_string()));
        assert!(tables.contains(&"reference_tickets".to_string()));
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let conn = memory_conn().await;
        init_schema(&conn).await.unwrap();
        init_schema(&conn).await.unwrap();
    }

    #[tokio::test]
    async fn test_status_row_is_seeded_once() {
        let conn = memory_conn().await;
        init_schema(&conn).await.unwrap();
        init_schema(&conn).await.unwrap();

        let row = conn
            .query("SELECT COUNT(*) FROM cache_status", ())
            .await
            .unwrap()
            .next()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_running_flag_is_cleared_on_init() {
        let conn = memory_conn().await;
        init_schema(&conn).await.unwrap();

        conn.execute("UPDATE cache_status SET running = 1 WHERE id = 1", ())
            .await
            .unwrap();
        init_schema(&conn).await.unwrap();

        let row = conn
            .query("SELECT running FROM cache_status WHERE id = 1", ())
            .await
            .unwrap()
            .next()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_type_migration_adds_column() {
        let conn = memory_conn().await;
        conn.execute_batch(
            "CREATE TABLE cache_status (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_update TEXT,
                total_records INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                running INTEGER NOT NULL DEFAULT 0
            );
            INSERT INTO cache_status (id) VALUES (1);",
        )
        .await
        .unwrap();

        init_schema(&conn).await.unwrap();

        conn.execute(
            "UPDATE cache_status SET last_run_type = 'full' WHERE id = 1",
            (),
        )
        .await
        .unwrap();
    }
}
