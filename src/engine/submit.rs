//! Submission side of the engine.
//!
//! Access control and command parsing happen upstream; by the time a
//! submission lands here the caller has already decided it may proceed.
//! This module owns the rest: queue position, ETA, the status reply, the
//! durable job row, and the enqueue itself.

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::ChatTransport;
use crate::domain::{JobRequest, NewJob};
use crate::storage::Storage;

use super::eta::{estimate_eta, Eta};
use super::idle::ActivityTracker;
use super::queue::JobQueue;

/// How many completed-job durations feed the ETA estimate
const ETA_HISTORY_LIMIT: usize = 5;

/// An access-approved media submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub chat_id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub thread_id: Option<i64>,
    pub file_ref: String,
    pub file_name: Option<String>,
    pub duration_sec: Option<f64>,
}

/// What the submitter was told
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub job_id: i64,
    pub position: usize,
    pub eta: Eta,
    pub status_message_id: i64,
}

/// Accept a submission: reply with position/ETA, persist the `queued` row,
/// and enqueue the descriptor for the worker.
pub async fn submit_job(
    storage: &Storage,
    queue: &JobQueue,
    transport: &dyn ChatTransport,
    activity: &ActivityTracker,
    submission: Submission,
) -> Result<SubmissionReceipt> {
    let position = queue.len() + 1;
    let durations = storage
        .recent_durations(ETA_HISTORY_LIMIT)
        .await
        .context("Failed to load duration history")?;
    let eta = estimate_eta(&durations, position);

    let status_message_id = transport
        .send_reply(
            submission.chat_id,
            submission.thread_id,
            submission.message_id,
            &format!("Queued. Position: {position}. ETA: {eta}."),
        )
        .await
        .context("Failed to send queued reply")?;

    let job_id = storage
        .create_job(&NewJob {
            chat_id: submission.chat_id,
            user_id: submission.user_id,
            message_id: submission.message_id,
            thread_id: submission.thread_id,
            file_ref: submission.file_ref.clone(),
            file_name: submission.file_name.clone(),
            duration_sec: submission.duration_sec,
            status_message_id: Some(status_message_id),
        })
        .await
        .context("Failed to persist job")?;

    queue.enqueue(JobRequest {
        id: job_id,
        chat_id: submission.chat_id,
        thread_id: submission.thread_id,
        message_id: submission.message_id,
        file_ref: submission.file_ref,
        file_name: submission.file_name,
        status_message_id: Some(status_message_id),
    });
    activity.touch();

    info!(job_id, position, %eta, "Job queued");

    Ok(SubmissionReceipt {
        job_id,
        position,
        eta,
        status_message_id,
    })
}
