//! transkript - transcription chat-bot engine
//!
//! The core of a chat-bot that accepts media uploads, queues them for
//! transcription, and returns formatted transcripts.
//!
//! # Architecture
//!
//! Submissions and processing are decoupled by an unbounded FIFO channel:
//! - Arbitrarily many submission handlers enqueue job descriptors and
//!   report queue position/ETA to the submitter
//! - Exactly one worker drains the queue, driving each job through
//!   download, conversion, transcription, formatting and delivery
//! - Job state is durable in SQLite; every transition is one statement
//! - A failed job is recorded and reported, and the loop moves on
//!
//! The chat transport, audio converter and transcription backends are
//! consumed through traits in [`adapters`] and [`transcription`]; the
//! frontend that routes chat updates feeds [`engine::submit_job`].
//!
//! # Modules
//!
//! - `adapters`: external system integrations (Telegram, ffmpeg)
//! - `engine`: queue, ETA, worker loop, idle shutdown, submission
//! - `transcription`: backend selection, whisper CLIs, rendering
//! - `storage`: SQLite job store
//! - `domain`: data structures (Job, JobRequest, Segment)
//! - `cli`: command-line interface

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod storage;
pub mod system;
pub mod transcription;

// Re-export main types at crate root for convenience
pub use adapters::{AudioConverter, ChatTransport, FfmpegConverter, TelegramClient};
pub use config::Settings;
pub use domain::{Job, JobRequest, JobStatus, Segment};
pub use engine::{
    estimate_eta, idle_monitor, job_queue, submit_job, ActivityTracker, Eta, JobQueue,
    JobReceiver, PipelineError, Submission, SubmissionReceipt, Worker,
};
pub use storage::{Storage, StoreError};
pub use transcription::{choose_backend, Backend, TranscribeOptions, TranscriptionEngine, WhisperEngine};
