// crates/store/src/lib.rs
// SQLite job store: the durable system of record for submissions.

mod migrations;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use taskmill_core::{CoreError, JobRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("Failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),

    #[error("JSON error in stored params: {0}")]
    Params(#[from] serde_json::Error),

    #[error("Invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Invalid stored value: {0}")]
    Decode(#[from] CoreError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Main store handle wrapping a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct JobStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl JobStore {
    /// Open (or create) the store at the given path and run migrations.
    pub async fn new(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            db_path: path.to_owned(),
        };
        store.run_migrations().await?;

        info!("Job store opened at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// Uses `shared_cache(true)` so all pool connections share the same
    /// in-memory database. Without this, each connection gets its own
    /// separate database.
    pub async fn new_in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .shared_cache(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let store = Self {
            pool,
            db_path: PathBuf::new(),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open the store at the default location: `~/.cache/taskmill/taskmill.db`
    pub async fn open_default() -> StoreResult<Self> {
        let path = default_db_path()?;
        Self::new(&path).await
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run all inline migrations.
    ///
    /// Uses a `_migrations` table to track which migrations have already been
    /// applied, so that non-idempotent statements are only executed once.
    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS _migrations (version INTEGER PRIMARY KEY)")
            .execute(&self.pool)
            .await?;

        let row: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM _migrations")
            .fetch_one(&self.pool)
            .await?;
        let current_version = row.0 as usize;

        for (i, migration) in migrations::MIGRATIONS.iter().enumerate() {
            let version = i + 1; // 1-based
            if version > current_version {
                sqlx::query(migration).execute(&self.pool).await?;
                sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
                    .bind(version as i64)
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }

    /// Insert the record for a freshly submitted job. There is deliberately
    /// no update path: the row is immutable once written.
    pub async fn insert_job(&self, record: &JobRecord) -> StoreResult<()> {
        let params = serde_json::to_string(&record.params)?;
        sqlx::query(
            "INSERT INTO jobs (job_id, job_type, status, params, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.job_id)
        .bind(record.job_type.as_str())
        .bind(record.status.as_str())
        .bind(params)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch one record by job id.
    pub async fn get_job(&self, job_id: &str) -> StoreResult<Option<JobRecord>> {
        let row = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT job_id, job_type, status, params, created_at FROM jobs WHERE job_id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_record).transpose()
    }

    /// Most recently submitted jobs, newest first.
    pub async fn list_recent_jobs(&self, limit: u32) -> StoreResult<Vec<JobRecord>> {
        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT job_id, job_type, status, params, created_at FROM jobs
             ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    pub async fn count_jobs(&self) -> StoreResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

fn row_to_record(
    (job_id, job_type, status, params, created_at): (String, String, String, String, String),
) -> StoreResult<JobRecord> {
    Ok(JobRecord {
        job_id,
        job_type: job_type.parse()?,
        status: status.parse()?,
        params: serde_json::from_str(&params)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
    })
}

/// Default on-disk location, e.g. `~/.cache/taskmill/taskmill.db`.
pub fn default_db_path() -> StoreResult<PathBuf> {
    let cache = dirs::cache_dir().ok_or(StoreError::NoCacheDir)?;
    Ok(cache.join("taskmill").join("taskmill.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use taskmill_core::{JobStatus, JobType};

    fn record(job_id: &str, job_type: JobType) -> JobRecord {
        JobRecord {
            job_id: job_id.to_string(),
            job_type,
            status: JobStatus::Pending,
            params: json!({"processing_time": 2}),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let store = JobStore::new_in_memory().await.unwrap();
        let rec = record("job-1", JobType::ProcessData);
        store.insert_job(&rec).await.unwrap();

        let got = store.get_job("job-1").await.unwrap().unwrap();
        assert_eq!(got, rec);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = JobStore::new_in_memory().await.unwrap();
        assert!(store.get_job("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = JobStore::new_in_memory().await.unwrap();
        let rec = record("job-1", JobType::GenerateReport);
        store.insert_job(&rec).await.unwrap();
        assert!(store.insert_job(&rec).await.is_err());
    }

    #[tokio::test]
    async fn test_list_recent_orders_newest_first() {
        let store = JobStore::new_in_memory().await.unwrap();
        for i in 0..5i64 {
            let mut rec = record(&format!("job-{i}"), JobType::SimulateLoad);
            rec.created_at = Utc::now() + chrono::Duration::seconds(i);
            store.insert_job(&rec).await.unwrap();
        }

        let recent = store.list_recent_jobs(3).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["job-4", "job-3", "job-2"]);
        assert_eq!(store.count_jobs().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_status_is_the_value_written_at_insert() {
        // The store exposes no update; whatever status the record was created
        // with is what every later read returns.
        let store = JobStore::new_in_memory().await.unwrap();
        store
            .insert_job(&record("job-1", JobType::LongRunningTask))
            .await
            .unwrap();

        let first = store.get_job("job-1").await.unwrap().unwrap();
        let second = store.get_job("job-1").await.unwrap().unwrap();
        assert_eq!(first.status, JobStatus::Pending);
        assert_eq!(second.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_reopen_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskmill.db");

        {
            let store = JobStore::new(&path).await.unwrap();
            store
                .insert_job(&record("job-1", JobType::ProcessData))
                .await
                .unwrap();
        }

        let store = JobStore::new(&path).await.unwrap();
        let got = store.get_job("job-1").await.unwrap().unwrap();
        assert_eq!(got.job_type, JobType::ProcessData);
    }
}
