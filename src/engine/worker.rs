//! Single-consumer worker driving the media pipeline.
//!
//! One job is in flight at a time; stages run sequentially inside it.
//! Every stage returns a `Result` and the first failure aborts the rest of
//! the pipeline; the loop pattern-matches on the outcome, records the
//! terminal state, and moves on to the next job. A job's failure never
//! stalls the queue.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::adapters::{AudioConverter, ChatTransport};
use crate::config::Settings;
use crate::domain::{normalize_segments, JobRequest};
use crate::storage::{Storage, StoreError};
use crate::transcription::formatting::{segments_to_json, segments_to_txt};
use crate::transcription::{Backend, TranscribeOptions, TranscriptionEngine};

use super::idle::ActivityTracker;
use super::progress::format_progress;
use super::queue::JobReceiver;

/// Ordered pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Convert,
    Transcribe,
    Format,
    Deliver,
    Cleanup,
}

impl Stage {
    /// Label shown in the progress message before the stage starts
    pub fn progress_label(&self) -> &'static str {
        match self {
            Self::Download => "downloading",
            Self::Convert => "converting",
            Self::Transcribe => "transcribing",
            Self::Format => "formatting",
            Self::Deliver => "uploading",
            Self::Cleanup => "cleaning up",
        }
    }
}

/// Stage-tagged pipeline failure.
///
/// The `Display` text is what lands verbatim on the job row and in the
/// user-facing failure message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("download failed: {0}")]
    Download(#[source] anyhow::Error),

    #[error("audio conversion failed: {0}")]
    Convert(#[source] anyhow::Error),

    #[error("transcription failed: {0}")]
    Transcribe(#[source] anyhow::Error),

    #[error("transcript rendering failed: {0}")]
    Format(#[source] anyhow::Error),

    #[error("delivery failed: {0}")]
    Deliver(#[source] anyhow::Error),

    #[error("job store update failed: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Stage at which the pipeline stopped
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Download(_) => Some(Stage::Download),
            Self::Convert(_) => Some(Stage::Convert),
            Self::Transcribe(_) => Some(Stage::Transcribe),
            Self::Format(_) => Some(Stage::Format),
            Self::Deliver(_) => Some(Stage::Deliver),
            Self::Store(_) => None,
        }
    }
}

/// Working-directory files for one job, all derived from the job id
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub input: PathBuf,
    pub wav: PathBuf,
    pub txt: PathBuf,
    pub md: PathBuf,
    pub json: PathBuf,
}

impl JobPaths {
    pub fn new(media_dir: &Path, job_id: i64, file_name: Option<&str>) -> Self {
        let suffix = safe_suffix(file_name);
        Self {
            input: media_dir.join(format!("{job_id}{suffix}")),
            wav: media_dir.join(format!("{job_id}.wav")),
            txt: media_dir.join(format!("{job_id}.txt")),
            md: media_dir.join(format!("{job_id}.md")),
            json: media_dir.join(format!("{job_id}.json")),
        }
    }

    fn all(&self) -> [&PathBuf; 5] {
        [&self.input, &self.wav, &self.txt, &self.md, &self.json]
    }

    /// Best-effort removal of every working file. Absent files and
    /// deletion failures are swallowed; safe to call repeatedly.
    pub async fn cleanup(&self) {
        for path in self.all() {
            let _ = tokio::fs::remove_file(path).await;
        }
    }
}

/// Input-file suffix preserved through download; `.bin` when unknown
fn safe_suffix(file_name: Option<&str>) -> String {
    let Some(name) = file_name.filter(|n| !n.is_empty()) else {
        return ".bin".to_string();
    };
    match Path::new(name).extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => ".bin".to_string(),
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// The single consumer of the job queue
pub struct Worker {
    storage: Arc<Storage>,
    transport: Arc<dyn ChatTransport>,
    converter: Arc<dyn AudioConverter>,
    engine: Arc<dyn TranscriptionEngine>,
    activity: Arc<ActivityTracker>,
    settings: Arc<Settings>,
    backend: Backend,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage: Arc<Storage>,
        transport: Arc<dyn ChatTransport>,
        converter: Arc<dyn AudioConverter>,
        engine: Arc<dyn TranscriptionEngine>,
        activity: Arc<ActivityTracker>,
        settings: Arc<Settings>,
        backend: Backend,
    ) -> Self {
        Self {
            storage,
            transport,
            converter,
            engine,
            activity,
            settings,
            backend,
        }
    }

    /// Consume jobs until the queue closes or the task is cancelled.
    ///
    /// Every dequeued job reaches `done` or `failed`; a pipeline error is
    /// recorded and the loop continues with the next job.
    pub async fn run(self, mut jobs: JobReceiver) {
        info!(backend = self.backend.name(), "Worker started");
        while let Some(job) = jobs.recv().await {
            let paths = JobPaths::new(&self.settings.media_dir, job.id, job.file_name.as_deref());
            match self.process(&job, &paths).await {
                Ok(()) => {
                    info!(job_id = job.id, "Job completed");
                }
                Err(err) => {
                    warn!(job_id = job.id, error = %err, "Job failed");
                    if let Err(store_err) =
                        self.storage.mark_failed(job.id, &err.to_string()).await
                    {
                        error!(job_id = job.id, error = %store_err, "Failed to record job failure");
                    }
                    if let Some(message_id) = job.status_message_id {
                        // Best effort only; a failed edit is not a second failure
                        let _ = self
                            .transport
                            .edit_message(job.chat_id, message_id, &format!("Failed: {err}"))
                            .await;
                    }
                    paths.cleanup().await;
                }
            }
        }
        info!("Job queue closed, worker exiting");
    }

    /// Drive one job through the pipeline stages in order
    #[instrument(skip(self, job, paths), fields(job_id = job.id))]
    async fn process(&self, job: &JobRequest, paths: &JobPaths) -> Result<(), PipelineError> {
        self.storage
            .mark_running(job.id, unix_now(), self.backend.name())
            .await?;

        tokio::fs::create_dir_all(&self.settings.media_dir)
            .await
            .map_err(|e| PipelineError::Download(e.into()))?;

        self.report(job, Stage::Download).await;
        self.transport
            .download(&job.file_ref, &paths.input)
            .await
            .map_err(PipelineError::Download)?;

        self.report(job, Stage::Convert).await;
        self.converter
            .convert_to_wav(&paths.input, &paths.wav)
            .await
            .map_err(PipelineError::Convert)?;

        self.report(job, Stage::Transcribe).await;
        let options = TranscribeOptions::from_settings(&self.settings);
        let segments = self
            .engine
            .transcribe(&paths.wav, &options)
            .await
            .map_err(PipelineError::Transcribe)?;

        let segments = normalize_segments(segments);
        let text = segments_to_txt(&segments);
        let json = segments_to_json(&segments).map_err(|e| PipelineError::Format(e.into()))?;
        for (path, content) in [(&paths.txt, &text), (&paths.md, &text), (&paths.json, &json)] {
            tokio::fs::write(path, content)
                .await
                .map_err(|e| PipelineError::Format(anyhow!("{}: {e}", path.display())))?;
        }

        self.report(job, Stage::Deliver).await;
        for path in [&paths.txt, &paths.md, &paths.json] {
            self.transport
                .send_document(job.chat_id, job.thread_id, job.message_id, path)
                .await
                .map_err(PipelineError::Deliver)?;
        }

        let output_paths = serde_json::json!({
            "txt": paths.txt,
            "md": paths.md,
            "json": paths.json,
        })
        .to_string();
        self.storage
            .mark_done(job.id, unix_now(), &output_paths)
            .await?;

        paths.cleanup().await;
        self.activity.touch();

        Ok(())
    }

    /// Best-effort progress edit before a stage starts
    async fn report(&self, job: &JobRequest, stage: Stage) {
        let Some(message_id) = job.status_message_id else {
            return;
        };
        let text = format_progress(stage.progress_label(), None, None);
        if let Err(err) = self
            .transport
            .edit_message(job.chat_id, message_id, &text)
            .await
        {
            warn!(job_id = job.id, error = %err, "Progress edit failed");
        }
    }
}
