pub mod repositories;
pub mod schema;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// SQLite-backed telemetry store
///
/// Wraps the connection pool; schema bootstrap and migrations run once
/// at connect time, before any repository touches the tables.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at `url` and ensure the
    /// schema is current.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url: {url}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to open telemetry database")?;

        Self::health_check(&pool).await?;
        schema::ensure_schema(&pool).await?;

        info!(url, "telemetry database ready");
        Ok(Self { pool })
    }

    /// In-memory database, used by tests and dry runs.
    ///
    /// A single connection is forced because every new SQLite
    /// `:memory:` connection would otherwise get its own empty store.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("failed to open in-memory database")?;

        schema::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn health_check(pool: &SqlitePool) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(pool)
            .await
            .context("database health check failed")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn customers(&self) -> repositories::CustomerRepository {
        repositories::CustomerRepository::new(self.pool.clone())
    }

    pub fn telemetry(&self) -> repositories::TelemetryRepository {
        repositories::TelemetryRepository::new(self.pool.clone())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
