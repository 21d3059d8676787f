//! SQLite-backed job store.
//!
//! The store is the durable source of truth for job state. Submission
//! handlers insert `queued` rows; the worker applies every later
//! transition. Each update is a single statement; there is no
//! cross-statement transaction spanning a job's lifecycle.

use std::path::Path;
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{Job, JobStatus, NewJob};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id           INTEGER NOT NULL,
    user_id           INTEGER NOT NULL,
    message_id        INTEGER NOT NULL,
    thread_id         INTEGER,
    file_ref          TEXT NOT NULL,
    file_name         TEXT,
    duration_sec      REAL,
    status            TEXT NOT NULL,
    backend           TEXT,
    status_message_id INTEGER,
    started_at        REAL,
    finished_at       REAL,
    error             TEXT,
    output_paths      TEXT,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_status_finished
    ON jobs (status, finished_at);
";

/// Errors from the job store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to the jobs database.
///
/// The connection is serialized behind an async mutex; every public method
/// is one short statement, so holding the lock across the call is fine.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open (and create if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a new `queued` job and return its id
    pub async fn create_job(&self, new: &NewJob) -> Result<i64, StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO jobs (
                chat_id, user_id, message_id, thread_id, file_ref, file_name,
                duration_sec, status, status_message_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                new.chat_id,
                new.user_id,
                new.message_id,
                new.thread_id,
                new.file_ref,
                new.file_name,
                new.duration_sec,
                JobStatus::Queued.as_str(),
                new.status_message_id,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Transition a job to `running`, recording start time and backend
    pub async fn mark_running(
        &self,
        job_id: i64,
        started_at: f64,
        backend: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE jobs SET status = ?1, started_at = ?2, backend = ?3 WHERE id = ?4",
            params![JobStatus::Running.as_str(), started_at, backend, job_id],
        )?;
        Ok(())
    }

    /// Transition a job to `done`, recording finish time and artifact paths
    pub async fn mark_done(
        &self,
        job_id: i64,
        finished_at: f64,
        output_paths: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE jobs SET status = ?1, finished_at = ?2, output_paths = ?3 WHERE id = ?4",
            params![JobStatus::Done.as_str(), finished_at, output_paths, job_id],
        )?;
        Ok(())
    }

    /// Transition a job to `failed`, recording the error text verbatim
    pub async fn mark_failed(&self, job_id: i64, error: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE jobs SET status = ?1, error = ?2 WHERE id = ?3",
            params![JobStatus::Failed.as_str(), error, job_id],
        )?;
        Ok(())
    }

    /// Fetch a job by id
    pub async fn job(&self, job_id: i64) -> Result<Option<Job>, StoreError> {
        let conn = self.conn.lock().await;
        let job = conn
            .query_row(
                "SELECT id, chat_id, user_id, message_id, thread_id, file_ref, file_name,
                        duration_sec, status, backend, status_message_id, started_at,
                        finished_at, error, output_paths, created_at
                 FROM jobs WHERE id = ?1",
                params![job_id],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    /// Most recent jobs, newest first
    pub async fn recent_jobs(&self, limit: usize) -> Result<Vec<Job>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, user_id, message_id, thread_id, file_ref, file_name,
                    duration_sec, status, backend, status_message_id, started_at,
                    finished_at, error, output_paths, created_at
             FROM jobs ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], job_from_row)?;
        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row?);
        }
        Ok(jobs)
    }

    /// Processing durations (whole seconds) of the most recently finished
    /// `done` jobs, used for ETA estimates.
    pub async fn recent_durations(&self, limit: usize) -> Result<Vec<u64>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT started_at, finished_at FROM jobs
             WHERE status = 'done' AND started_at IS NOT NULL AND finished_at IS NOT NULL
             ORDER BY finished_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let started: f64 = row.get(0)?;
            let finished: f64 = row.get(1)?;
            Ok((started, finished))
        })?;
        let mut durations = Vec::new();
        for row in rows {
            let (started, finished) = row?;
            durations.push((finished - started) as u64);
        }
        Ok(durations)
    }
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let status_text: String = row.get(8)?;
    let status = JobStatus::from_str(&status_text).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(Job {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        user_id: row.get(2)?,
        message_id: row.get(3)?,
        thread_id: row.get(4)?,
        file_ref: row.get(5)?,
        file_name: row.get(6)?,
        duration_sec: row.get(7)?,
        status,
        backend: row.get(9)?,
        status_message_id: row.get(10)?,
        started_at: row.get(11)?,
        finished_at: row.get(12)?,
        error: row.get(13)?,
        output_paths: row.get(14)?,
        created_at: row.get(15)?,
    })
}
