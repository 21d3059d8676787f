//! ffmpeg-based audio conversion.
//!
//! Every transcription backend consumes mono 16 kHz WAV, so all input
//! media goes through one fixed ffmpeg invocation first.

use std::ffi::OsString;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::AudioConverter;

/// Argument template: strip video, downmix to mono, resample to 16 kHz
pub fn build_ffmpeg_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-y"),
        OsString::from("-i"),
        input.as_os_str().to_os_string(),
        OsString::from("-vn"),
        OsString::from("-ac"),
        OsString::from("1"),
        OsString::from("-ar"),
        OsString::from("16000"),
        OsString::from("-f"),
        OsString::from("wav"),
        output.as_os_str().to_os_string(),
    ]
}

/// Converter shelling out to an ffmpeg binary
pub struct FfmpegConverter {
    binary_path: String,
}

impl FfmpegConverter {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }
}

impl Default for FfmpegConverter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl AudioConverter for FfmpegConverter {
    async fn convert_to_wav(&self, input: &Path, output: &Path) -> Result<()> {
        let out = Command::new(&self.binary_path)
            .args(build_ffmpeg_args(input, output))
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", self.binary_path))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let exit_code = out.status.code().unwrap_or(-1);
            anyhow::bail!(
                "{} exited with code {}: {}",
                self.binary_path,
                exit_code,
                stderr.trim()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_template() {
        let args = build_ffmpeg_args(Path::new("in.mp4"), Path::new("out.wav"));
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            vec!["-y", "-i", "in.mp4", "-vn", "-ac", "1", "-ar", "16000", "-f", "wav", "out.wav"]
        );
    }
}
