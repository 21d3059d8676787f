//! WhisperX CLI backend.
//!
//! Runs `whisperx` against the prepared WAV with JSON output into a fresh
//! temp directory, then parses the segment list it wrote. Diarization is
//! enabled when a HuggingFace token is available.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::process::Command;

use crate::domain::Segment;

use super::TranscribeOptions;

#[derive(Debug, Deserialize)]
struct WhisperXOutput {
    #[serde(default)]
    segments: Vec<Segment>,
}

/// Argument list for a whisperx invocation
pub fn build_whisperx_args(
    wav_path: &Path,
    out_dir: &Path,
    options: &TranscribeOptions,
) -> Vec<String> {
    let mut args = vec![
        wav_path.to_string_lossy().to_string(),
        "--model".to_string(),
        options.model.clone(),
        "--output_dir".to_string(),
        out_dir.to_string_lossy().to_string(),
        "--output_format".to_string(),
        "json".to_string(),
        "--language".to_string(),
        options.language.clone(),
        "--vad_method".to_string(),
        "silero".to_string(),
    ];
    if options.diarize {
        if let Some(token) = &options.hf_token {
            args.push("--diarize".to_string());
            args.push("--hf_token".to_string());
            args.push(token.clone());
        }
    }
    args
}

/// Transcribe via the whisperx binary
pub async fn run(
    whisperx_cmd: &str,
    wav_path: &Path,
    options: &TranscribeOptions,
) -> Result<Vec<Segment>> {
    let out_dir = tempfile::tempdir().context("Failed to create whisperx output dir")?;

    let output = Command::new(whisperx_cmd)
        .args(build_whisperx_args(wav_path, out_dir.path(), options))
        .output()
        .await
        .with_context(|| format!("Failed to spawn {whisperx_cmd}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        anyhow::bail!(
            "{} exited with code {}: {}",
            whisperx_cmd,
            exit_code,
            stderr.trim()
        );
    }

    parse_output_dir(out_dir.path())
}

/// Read the newest JSON file whisperx produced and pull out its segments
fn parse_output_dir(out_dir: &Path) -> Result<Vec<Segment>> {
    let pattern = out_dir.join("*.json");
    let mut json_files: Vec<_> = glob::glob(&pattern.to_string_lossy())
        .context("Invalid whisperx output pattern")?
        .filter_map(|entry| entry.ok())
        .collect();
    json_files.sort();

    let json_path = json_files
        .last()
        .context("WhisperX did not produce JSON output")?;

    let content = std::fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read {}", json_path.display()))?;

    let parsed: WhisperXOutput =
        serde_json::from_str(&content).context("Failed to parse whisperx JSON")?;

    Ok(parsed.segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(diarize: bool) -> TranscribeOptions {
        TranscribeOptions {
            model: "large-v2".to_string(),
            language: "auto".to_string(),
            diarize,
            hf_token: diarize.then(|| "hf_secret".to_string()),
        }
    }

    #[test]
    fn test_args_without_diarization() {
        let args = build_whisperx_args(Path::new("1.wav"), Path::new("/tmp/out"), &options(false));
        assert_eq!(args[0], "1.wav");
        assert!(args.contains(&"--vad_method".to_string()));
        assert!(!args.contains(&"--diarize".to_string()));
        assert!(!args.contains(&"--hf_token".to_string()));
    }

    #[test]
    fn test_args_with_diarization() {
        let args = build_whisperx_args(Path::new("1.wav"), Path::new("/tmp/out"), &options(true));
        assert!(args.contains(&"--diarize".to_string()));
        assert!(args.contains(&"hf_secret".to_string()));
    }

    #[test]
    fn test_parse_picks_latest_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"segments": []}"#).unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{"segments": [{"start": 0.0, "end": 1.0, "text": "hi"}]}"#,
        )
        .unwrap();

        let segments = parse_output_dir(dir.path()).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hi");
    }

    #[test]
    fn test_parse_empty_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(parse_output_dir(dir.path()).is_err());
    }
}
