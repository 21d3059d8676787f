//! CPU backend via the CTranslate2 whisper CLI (`whisper-ctranslate2`).
//!
//! Same flow as the WhisperX backend but pinned to CPU with int8 compute;
//! the output JSON is located by the input's file stem.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::process::Command;

use crate::domain::Segment;

use super::TranscribeOptions;

#[derive(Debug, Deserialize)]
struct FasterWhisperOutput {
    #[serde(default)]
    segments: Vec<Segment>,
}

/// Argument list for a whisper-ctranslate2 invocation.
///
/// `auto` language means detection, which the CLI expresses by omitting
/// the flag entirely.
pub fn build_faster_whisper_args(
    wav_path: &Path,
    out_dir: &Path,
    options: &TranscribeOptions,
) -> Vec<String> {
    let mut args = vec![
        wav_path.to_string_lossy().to_string(),
        "--model".to_string(),
        options.model.clone(),
        "--device".to_string(),
        "cpu".to_string(),
        "--compute_type".to_string(),
        "int8".to_string(),
        "--output_format".to_string(),
        "json".to_string(),
        "--output_dir".to_string(),
        out_dir.to_string_lossy().to_string(),
    ];
    if options.language != "auto" {
        args.push("--language".to_string());
        args.push(options.language.clone());
    }
    args
}

/// Transcribe via the CPU whisper binary
pub async fn run(
    faster_whisper_cmd: &str,
    wav_path: &Path,
    options: &TranscribeOptions,
) -> Result<Vec<Segment>> {
    let out_dir = tempfile::tempdir().context("Failed to create transcriber output dir")?;

    let output = Command::new(faster_whisper_cmd)
        .args(build_faster_whisper_args(wav_path, out_dir.path(), options))
        .output()
        .await
        .with_context(|| format!("Failed to spawn {faster_whisper_cmd}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        anyhow::bail!(
            "{} exited with code {}: {}",
            faster_whisper_cmd,
            exit_code,
            stderr.trim()
        );
    }

    let stem = wav_path.file_stem().unwrap_or_default().to_string_lossy();
    let json_path = out_dir.path().join(format!("{stem}.json"));

    let content = std::fs::read_to_string(&json_path)
        .with_context(|| format!("Transcriber produced no output at {}", json_path.display()))?;

    let parsed: FasterWhisperOutput =
        serde_json::from_str(&content).context("Failed to parse transcriber JSON")?;

    Ok(parsed.segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(language: &str) -> TranscribeOptions {
        TranscribeOptions {
            model: "large-v2".to_string(),
            language: language.to_string(),
            diarize: false,
            hf_token: None,
        }
    }

    #[test]
    fn test_args_pin_cpu_int8() {
        let args =
            build_faster_whisper_args(Path::new("7.wav"), Path::new("/tmp/out"), &options("de"));
        assert_eq!(args[0], "7.wav");
        assert!(args.windows(2).any(|w| w == ["--device", "cpu"]));
        assert!(args.windows(2).any(|w| w == ["--compute_type", "int8"]));
        assert!(args.windows(2).any(|w| w == ["--language", "de"]));
    }

    #[test]
    fn test_auto_language_omits_flag() {
        let args =
            build_faster_whisper_args(Path::new("7.wav"), Path::new("/tmp/out"), &options("auto"));
        assert!(!args.contains(&"--language".to_string()));
    }
}
