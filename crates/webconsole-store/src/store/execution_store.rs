//! ExecutionStore - SQLite-based execution record storage

use super::helpers::row_to_record;
use super::traits::ExecutionStoreTrait;
use crate::error::{Error, Result};
use crate::record::{ExecutionId, ExecutionRecord};
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Execution record store backed by SQLite
#[derive(Clone)]
pub struct ExecutionStore {
    pool: SqlitePool,
}

impl ExecutionStore {
    /// Create a new store with the given connection pool
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new store from a database path
    ///
    /// This will create the database file if it doesn't exist and run migrations.
    pub async fn from_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Database(format!("failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        info!("SQLite execution store initialized at {}", db_path.display());
        Ok(store)
    }

    /// Create a new in-memory store (for testing)
    ///
    /// The single connection is never recycled, since dropping it would
    /// discard the database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        debug!("In-memory SQLite execution store initialized");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS executions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                command TEXT NOT NULL,
                status INTEGER,
                output BLOB NOT NULL DEFAULT x'',
                created_at TEXT NOT NULL,
                finished_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_executions_created
            ON executions(created_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        debug!("Database migrations completed");
        Ok(())
    }

    /// Get a reference to the underlying connection pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a pending record
    #[instrument(skip(self, command))]
    pub async fn create_pending(&self, command: &str) -> Result<ExecutionId> {
        let result = sqlx::query(
            r#"
            INSERT INTO executions (command, created_at)
            VALUES (?1, ?2)
            "#,
        )
        .bind(command)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        debug!("Created pending execution {}", id);
        Ok(id)
    }

    /// Finish a pending record
    ///
    /// Status, output and finish time are written in one transaction. A record
    /// that is already finished is left untouched and `AlreadyFinished` is
    /// returned.
    #[instrument(skip(self, output), fields(output_len = output.len()))]
    pub async fn finish(&self, id: ExecutionId, status: i32, output: &[u8]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let row = sqlx::query("SELECT status FROM executions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .ok_or(Error::ExecutionNotFound(id))?;

        let current: Option<i32> = row.get("status");
        if current.is_some() {
            return Err(Error::AlreadyFinished(id));
        }

        sqlx::query(
            r#"
            UPDATE executions
            SET status = ?2, output = ?3, finished_at = ?4
            WHERE id = ?1 AND status IS NULL
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(output)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        debug!("Finished execution {} with status {}", id, status);
        Ok(())
    }

    /// Get a record by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, command, status, output, created_at, finished_at
            FROM executions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        row.map(row_to_record).transpose()
    }

    /// List recent records
    #[instrument(skip(self))]
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, command, status, output, created_at, finished_at
            FROM executions
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(row_to_record).collect()
    }
}

#[async_trait::async_trait]
impl ExecutionStoreTrait for ExecutionStore {
    async fn create_pending(&self, command: &str) -> Result<ExecutionId> {
        ExecutionStore::create_pending(self, command).await
    }

    async fn finish(&self, id: ExecutionId, status: i32, output: &[u8]) -> Result<()> {
        ExecutionStore::finish(self, id, status, output).await
    }

    async fn get(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>> {
        ExecutionStore::get(self, id).await
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ExecutionRecord>> {
        ExecutionStore::list_recent(self, limit).await
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
