//! Transcription backends.
//!
//! Two engines are supported: WhisperX (accelerator-backed, optional
//! diarization) and the CTranslate2 whisper CLI (CPU-only). Both shell out
//! to their binaries and parse the JSON they produce. The backend is
//! chosen once at startup and passed down as a value, never re-resolved
//! per job.

pub mod faster_whisper;
pub mod formatting;
pub mod whisperx;

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Settings;
use crate::domain::Segment;

/// A transcription engine implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// WhisperX CLI; needs a CUDA-capable accelerator to be worthwhile
    WhisperX,
    /// faster-whisper (CTranslate2) CLI on CPU
    FasterWhisper,
}

impl Backend {
    /// Name recorded on job rows and shown in status output
    pub fn name(self) -> &'static str {
        match self {
            Self::WhisperX => "whisperx",
            Self::FasterWhisper => "faster",
        }
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "whisperx" => Ok(Self::WhisperX),
            "faster" | "faster-whisper" => Ok(Self::FasterWhisper),
            other => anyhow::bail!("Unknown backend '{other}' (expected 'whisperx' or 'faster')"),
        }
    }
}

/// Pick the backend once at process start.
///
/// A configured override always wins; otherwise WhisperX when a compatible
/// accelerator was detected, the CPU engine when not.
pub fn choose_backend(force: Option<Backend>, has_accelerator: bool) -> Backend {
    if let Some(forced) = force {
        return forced;
    }
    if has_accelerator {
        Backend::WhisperX
    } else {
        Backend::FasterWhisper
    }
}

/// Per-job transcription parameters
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    pub model: String,
    pub language: String,
    pub diarize: bool,
    pub hf_token: Option<String>,
}

impl TranscribeOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.model.clone(),
            language: settings.default_language.clone(),
            diarize: settings.hf_token.is_some(),
            hf_token: settings.hf_token.clone(),
        }
    }
}

/// Trait seam between the pipeline and the whisper processes
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Backend name for job rows and logs
    fn name(&self) -> &str;

    /// Transcribe a mono 16 kHz WAV into ordered segments
    async fn transcribe(&self, wav_path: &Path, options: &TranscribeOptions)
        -> Result<Vec<Segment>>;
}

/// Production engine dispatching on the selected [`Backend`]
pub struct WhisperEngine {
    backend: Backend,
    whisperx_cmd: String,
    faster_whisper_cmd: String,
}

impl WhisperEngine {
    pub fn new(backend: Backend, settings: &Settings) -> Self {
        Self {
            backend,
            whisperx_cmd: settings.whisperx_cmd.clone(),
            faster_whisper_cmd: settings.faster_whisper_cmd.clone(),
        }
    }
}

#[async_trait]
impl TranscriptionEngine for WhisperEngine {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn transcribe(
        &self,
        wav_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Vec<Segment>> {
        match self.backend {
            Backend::WhisperX => whisperx::run(&self.whisperx_cmd, wav_path, options).await,
            Backend::FasterWhisper => {
                faster_whisper::run(&self.faster_whisper_cmd, wav_path, options).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_always_wins() {
        assert_eq!(
            choose_backend(Some(Backend::FasterWhisper), true),
            Backend::FasterWhisper
        );
        assert_eq!(
            choose_backend(Some(Backend::WhisperX), false),
            Backend::WhisperX
        );
    }

    #[test]
    fn test_accelerator_picks_whisperx() {
        assert_eq!(choose_backend(None, true), Backend::WhisperX);
        assert_eq!(choose_backend(None, false), Backend::FasterWhisper);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!(Backend::from_str("whisperx").unwrap(), Backend::WhisperX);
        assert_eq!(Backend::from_str("faster").unwrap(), Backend::FasterWhisper);
        assert_eq!(
            Backend::from_str("faster-whisper").unwrap(),
            Backend::FasterWhisper
        );
        assert!(Backend::from_str("parakeet").is_err());
    }
}
