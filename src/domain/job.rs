//! Job lifecycle types.
//!
//! A job is one user-submitted media item and its processing record. The
//! persisted row lives in the job store; the queue only carries the
//! lightweight [`JobRequest`] projection the pipeline needs to act.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Job lifecycle state machine: `queued -> running -> {done | failed}`.
///
/// Terminal states have no outgoing transitions. Exactly one job is
/// `running` at a time (single worker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    /// Text form used in the store and in user-facing output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// True once the job can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized status text coming back from the store
#[derive(Debug, Error)]
#[error("Unknown job status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A persisted job row.
///
/// Rows are created by the submission side with status `queued` and mutated
/// only by the worker afterwards. They are never deleted; completed rows
/// feed the duration history behind ETA estimates.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Monotonic integer id, never reused
    pub id: i64,

    /// Originating chat
    pub chat_id: i64,

    /// Submitting user
    pub user_id: i64,

    /// Message the artifacts reply to
    pub message_id: i64,

    /// Forum thread, when the chat has topics
    pub thread_id: Option<i64>,

    /// Opaque transport file reference
    pub file_ref: String,

    /// Original file name, when the transport knows it
    pub file_name: Option<String>,

    /// Media duration in seconds, when known at submission
    pub duration_sec: Option<f64>,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Transcription backend name, set when processing starts
    pub backend: Option<String>,

    /// Message edited with stage progress
    pub status_message_id: Option<i64>,

    /// UNIX seconds at which processing started
    pub started_at: Option<f64>,

    /// UNIX seconds at which processing finished
    pub finished_at: Option<f64>,

    /// Failure text, set iff status is `failed`
    pub error: Option<String>,

    /// JSON map of delivered artifact paths, set on success
    pub output_paths: Option<String>,

    /// Insertion timestamp (RFC 3339)
    pub created_at: String,
}

/// Fields required to insert a new `queued` job
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub chat_id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub thread_id: Option<i64>,
    pub file_ref: String,
    pub file_name: Option<String>,
    pub duration_sec: Option<f64>,
    pub status_message_id: Option<i64>,
}

/// Transient queue descriptor: exactly the fields the pipeline needs.
///
/// Exists only between enqueue and dequeue; the store row remains the
/// source of truth.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub id: i64,
    pub chat_id: i64,
    pub thread_id: Option<i64>,
    pub message_id: i64,
    pub file_ref: String,
    pub file_name: Option<String>,
    pub status_message_id: Option<i64>,
}

impl Job {
    /// Queue descriptor projection of this row
    pub fn to_request(&self) -> JobRequest {
        JobRequest {
            id: self.id,
            chat_id: self.chat_id,
            thread_id: self.thread_id,
            message_id: self.message_id,
            file_ref: self.file_ref.clone(),
            file_name: self.file_name.clone(),
            status_message_id: self.status_message_id,
        }
    }
}
