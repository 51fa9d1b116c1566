//! Database connection management.

use crate::domain::models::DatabaseConfig;
use crate::domain::ports::errors::StoreError;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Database connection pool manager.
///
/// Opens the `SQLite` database with WAL mode for concurrent readers, runs
/// pending migrations, and hands out the pool.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the configured database file and run
    /// pending migrations.
    ///
    /// Pragmas: WAL journal, NORMAL synchronous, foreign keys on, 5 second
    /// busy timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = format!("sqlite://{}", config.path);
        let options = SqliteConnectOptions::from_str(&url)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .idle_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        Self::migrate(&pool).await?;

        info!(path = %config.path, "Database ready");
        Ok(Self { pool })
    }

    /// Open an in-memory database with migrations applied.
    ///
    /// Pool size is pinned to one connection: every `sqlite::memory:`
    /// connection is its own empty database, so a larger pool would hand
    /// out connections without the schema.
    pub async fn connect_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))
    }

    /// Handle to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
