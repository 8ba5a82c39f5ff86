use std::sync::Arc;

use libsql::{Builder, Connection};

use crate::config::DatabaseConfig;
use crate::error::Result;

use super::schema;

/// Shared handle to the libsql store. Clones are cheap and point at the
/// same underlying database.
#[derive(Clone)]
pub struct Database {
    db: Arc<libsql::Database>,
}

impl Database {
    /// Opens the store described by `config`, applies its pragmas and
    /// brings the schema up to date.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database = Self {
            db: Arc::new(open(config).await?),
        };

        let conn = database.connect()?;
        apply_pragmas(&conn, config).await;
        schema::init_schema(&conn).await?;

        Ok(database)
    }

    pub fn connect(&self) -> Result<Connection> {
        Ok(self.db.connect()?)
    }

    /// Pulls fresh frames from the remote primary. Purely local files have
    /// nothing to pull, which libsql reports as an error we can ignore.
    pub async fn sync(&self) -> Result<()> {
        if let Ok(replicated) = self.db.sync().await {
            tracing::debug!(?replicated, "pulled changes from remote primary");
        }
        Ok(())
    }
}

/// Chooses the libsql builder for the configured URL. `libsql://` and
/// `https://` URLs talk to a remote primary, through an embedded replica
/// when `local_path` is set. Anything else opens as a local file, with
/// `:memory:` available for tests.
async fn open(config: &DatabaseConfig) -> Result<libsql::Database> {
    if config.url.starts_with("libsql://") || config.url.starts_with("https://") {
        let token = config.auth_token.clone().unwrap_or_default();
        let db = match &config.local_path {
            Some(replica) => {
                Builder::new_remote_replica(replica, config.url.clone(), token)
                    .build()
                    .await?
            }
            None => Builder::new_remote(config.url.clone(), token).build().await?,
        };
        return Ok(db);
    }

    let path = config.url.strip_prefix("file:").unwrap_or(&config.url);
    Ok(Builder::new_local(path).build().await?)
}

/// Remote backends accept only a subset of pragmas, so a rejected pragma
/// logs a warning instead of failing startup.
async fn apply_pragmas(conn: &Connection, config: &DatabaseConfig) {
    let pragmas = [
        format!("PRAGMA busy_timeout = {}", config.busy_timeout_ms),
        format!("PRAGMA journal_mode = {}", config.journal_mode),
        format!("PRAGMA synchronous = {}", config.synchronous),
    ];

    for pragma in pragmas {
        if let Err(error) = conn.execute_batch(&pragma).await {
            tracing::warn!(%pragma, %error, "pragma not applied");
        }
    }
}
