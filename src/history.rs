//! Durable, append-only history storage.
//!
//! Two backends implement [`HistoryStore`]: a SQLite table and a JSONL file.
//! Both only ever append — the audit trail is never updated or deleted by
//! this crate. Storage is acquired per write and released immediately, on
//! every path. Persistence failures are surfaced to the caller: silently
//! losing a history entry is the one thing this module must never do.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::io::AsyncWriteExt;

use crate::domain::content::{BatchReport, HistoryRecord};
use crate::error::Result;

/// Storage trait for appending history records.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one record to durable storage.
    ///
    /// # Errors
    /// Returns an error if the backend is unavailable or the write fails.
    /// Callers must treat that as a visible per-item failure, not abort the
    /// batch.
    async fn append(&self, record: &HistoryRecord) -> Result<()>;
}

// ============================================================================
// SQLite backend
// ============================================================================

/// History store backed by a SQLite table (see `migrations/`).
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

impl SqliteHistoryStore {
    /// Open (creating if missing) the database at `path` and install the
    /// schema.
    pub async fn connect(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        crate::migrator().run(&pool).await?;
        Ok(Self { pool })
    }

    /// Open an in-memory database with the schema installed. Useful for
    /// tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A single connection: each sqlite in-memory connection is its own db
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        crate::migrator().run(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an already-migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    #[tracing::instrument(skip(self, record), fields(item_id = %record.content.request.id))]
    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        // Acquire per write, release on drop
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            "INSERT INTO history (
                item_id, run_id, audience, kind, content, produced_via,
                produced_at, data_summary, delivery_succeeded, channel_ref,
                error_detail, recorded_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.content.request.id.0.to_string())
        .bind(record.run_id.0.to_string())
        .bind(&record.content.request.audience.name)
        .bind(record.content.request.kind.as_str())
        .bind(&record.content.text)
        .bind(record.content.origin.as_str())
        .bind(record.content.produced_at)
        .bind(&record.data_summary)
        .bind(record.outcome.succeeded)
        .bind(record.outcome.channel_ref.as_deref())
        .bind(record.outcome.error_detail.as_deref())
        .bind(record.recorded_at)
        .execute(&mut *conn)
        .await?;

        tracing::debug!("Appended history row");
        Ok(())
    }
}

// ============================================================================
// JSONL backend
// ============================================================================

/// History store appending one JSON line per record to a file.
pub struct JsonlHistoryStore {
    path: PathBuf,
}

impl JsonlHistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonlHistoryStore {
    #[tracing::instrument(skip(self, record), fields(item_id = %record.content.request.id, path = %self.path.display()))]
    async fn append(&self, record: &HistoryRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        // Open, append, close on every write
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Appended history line");
        Ok(())
    }
}

// ============================================================================
// Batch report artifact
// ============================================================================

/// Write the run's batch report as a JSON artifact under `dir`.
///
/// Written once, at the end of a run.
pub async fn write_report(report: &BatchReport, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("run_report_{}.json", report.run_id.0));
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(&path, json).await?;
    tracing::info!(path = %path.display(), "Wrote batch report");
    Ok(path)
}
