//! Adapter interfaces for external systems.
//!
//! The engine only talks to the outside world through these traits: the
//! chat transport that sources media and receives transcripts, and the
//! audio converter that normalizes media to a transcribable waveform.
//! Production implementations live alongside; tests substitute their own.

pub mod ffmpeg;
pub mod telegram;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

// Re-export the production adapters
pub use ffmpeg::FfmpegConverter;
pub use telegram::{TelegramClient, TelegramConfig};

/// Chat-side collaborator: file download, replies, progress edits.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fetch the file behind an opaque transport reference to `destination`
    async fn download(&self, file_ref: &str, destination: &Path) -> Result<()>;

    /// Send a text reply anchored to a message/thread; returns the new
    /// message id (used as the progress-edit target).
    async fn send_reply(
        &self,
        chat_id: i64,
        thread_id: Option<i64>,
        reply_to: i64,
        text: &str,
    ) -> Result<i64>;

    /// Send a file as a reply anchored to a message/thread
    async fn send_document(
        &self,
        chat_id: i64,
        thread_id: Option<i64>,
        reply_to: i64,
        path: &Path,
    ) -> Result<i64>;

    /// Replace the text of an existing message
    async fn edit_message(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()>;
}

/// Media-to-waveform conversion
#[async_trait]
pub trait AudioConverter: Send + Sync {
    /// Transcode arbitrary input media to mono 16 kHz WAV at `output`
    async fn convert_to_wav(&self, input: &Path, output: &Path) -> Result<()>;
}
