/// Inline SQL migrations for the taskmill job store.
///
/// We use simple inline migrations rather than sqlx migration files
/// because the schema is small and self-contained.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: jobs table. One row per submission; status is written at
    // insert time and never updated afterwards (the record is an audit log,
    // live status comes from the result backend).
    r#"
CREATE TABLE IF NOT EXISTS jobs (
    job_id     TEXT PRIMARY KEY,
    job_type   TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'pending',
    params     TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);
"#,
    // Migration 2: listing index
    r#"
CREATE INDEX IF NOT EXISTS idx_jobs_created ON jobs(created_at DESC);
"#,
];
