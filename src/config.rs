//! Engine configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (TRANSKRIPT_BOT_TOKEN, TRANSKRIPT_HF_TOKEN, ...)
//! 2. Config file (transkript.yaml, or an explicit --config path)
//! 3. Defaults (~/.transkript)
//!
//! Secrets are expected from the environment and never logged.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::transcription::Backend;

const CONFIG_FILE: &str = "transkript.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Chat bot token; required to run the engine, not for local commands
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Self-hosted Bot API server base URL
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// SQLite jobs database
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Working directory for per-job media files
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Shut down after this many minutes with no activity and an empty queue
    #[serde(default = "default_idle_shutdown_minutes")]
    pub idle_shutdown_minutes: u64,

    /// Transcription language; "auto" lets the backend detect
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Whisper model size
    #[serde(default = "default_model")]
    pub model: String,

    /// Force a backend regardless of detected hardware
    #[serde(default)]
    pub backend_force: Option<String>,

    /// HuggingFace token; enables diarization on the WhisperX backend
    #[serde(default)]
    pub hf_token: Option<String>,

    #[serde(default = "default_whisperx_cmd")]
    pub whisperx_cmd: String,

    #[serde(default = "default_faster_whisper_cmd")]
    pub faster_whisper_cmd: String,

    #[serde(default = "default_ffmpeg_cmd")]
    pub ffmpeg_cmd: String,
}

fn data_home() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".transkript"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn default_storage_path() -> PathBuf {
    data_home().join("bot.db")
}

fn default_media_dir() -> PathBuf {
    data_home().join("media")
}

fn default_idle_shutdown_minutes() -> u64 {
    5
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_model() -> String {
    "large-v2".to_string()
}

fn default_whisperx_cmd() -> String {
    "whisperx".to_string()
}

fn default_faster_whisper_cmd() -> String {
    "whisper-ctranslate2".to_string()
}

fn default_ffmpeg_cmd() -> String {
    "ffmpeg".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: None,
            storage_path: default_storage_path(),
            media_dir: default_media_dir(),
            idle_shutdown_minutes: default_idle_shutdown_minutes(),
            default_language: default_language(),
            model: default_model(),
            backend_force: None,
            hf_token: None,
            whisperx_cmd: default_whisperx_cmd(),
            faster_whisper_cmd: default_faster_whisper_cmd(),
            ffmpeg_cmd: default_ffmpeg_cmd(),
        }
    }
}

impl Settings {
    /// Load settings from an explicit path, `./transkript.yaml`, or
    /// defaults; then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = PathBuf::from(CONFIG_FILE);
                if local.exists() {
                    Self::from_file(&local)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Parse settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config YAML")
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("TRANSKRIPT_BOT_TOKEN") {
            self.bot_token = Some(token);
        }
        if let Ok(token) = std::env::var("TRANSKRIPT_HF_TOKEN") {
            self.hf_token = Some(token);
        }
        if let Ok(url) = std::env::var("TRANSKRIPT_API_BASE_URL") {
            self.api_base_url = Some(url);
        }
        if let Ok(backend) = std::env::var("TRANSKRIPT_BACKEND") {
            self.backend_force = Some(backend);
        }
    }

    /// Idle-shutdown window as a duration
    pub fn idle_limit(&self) -> Duration {
        Duration::from_secs(self.idle_shutdown_minutes * 60)
    }

    /// Parsed backend override, if configured
    pub fn backend_override(&self) -> Result<Option<Backend>> {
        self.backend_force
            .as_deref()
            .map(Backend::from_str)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.idle_shutdown_minutes, 5);
        assert_eq!(settings.default_language, "auto");
        assert_eq!(settings.model, "large-v2");
        assert!(settings.bot_token.is_none());
        assert!(settings.backend_override().unwrap().is_none());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let settings = Settings::from_yaml(
            "storage_path: /srv/transkript/jobs.db\nidle_shutdown_minutes: 30\n",
        )
        .unwrap();
        assert_eq!(settings.storage_path, PathBuf::from("/srv/transkript/jobs.db"));
        assert_eq!(settings.idle_shutdown_minutes, 30);
        assert_eq!(settings.ffmpeg_cmd, "ffmpeg");
    }

    #[test]
    fn test_backend_override_parse() {
        let settings = Settings::from_yaml("backend_force: faster\n").unwrap();
        assert_eq!(settings.backend_override().unwrap(), Some(Backend::FasterWhisper));

        let settings = Settings::from_yaml("backend_force: sherpa\n").unwrap();
        assert!(settings.backend_override().is_err());
    }

    #[test]
    fn test_idle_limit() {
        let settings = Settings::from_yaml("idle_shutdown_minutes: 2\n").unwrap();
        assert_eq!(settings.idle_limit(), Duration::from_secs(120));
    }
}
