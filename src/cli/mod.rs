//! Command-line interface for the transcription engine.
//!
//! `run` starts the engine process: the worker loop plus the idle-shutdown
//! monitor, with the Telegram transport wired in. The chat frontend feeds
//! submissions through [`crate::engine::submit_job`]. The remaining
//! commands are operator tools: local one-shot transcription and job-store
//! inspection.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adapters::{AudioConverter, FfmpegConverter, TelegramClient};
use crate::config::Settings;
use crate::domain::normalize_segments;
use crate::engine::{idle_monitor, job_queue, ActivityTracker, Worker};
use crate::storage::Storage;
use crate::system::{format_startup_info, SystemInfo};
use crate::transcription::formatting::{segments_to_json, segments_to_txt};
use crate::transcription::{
    choose_backend, Backend, TranscribeOptions, TranscriptionEngine, WhisperEngine,
};

/// transkript - transcription chat-bot engine
#[derive(Parser, Debug)]
#[command(name = "transkript")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file (defaults to ./transkript.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the engine: worker loop and idle-shutdown monitor
    Run,

    /// Transcribe a local media file without going through the queue
    Transcribe {
        /// Input media file
        input: PathBuf,

        /// Language override (e.g. "de"; default from config)
        #[arg(short, long)]
        language: Option<String>,

        /// Model override (default from config)
        #[arg(short, long)]
        model: Option<String>,

        /// Backend override ("whisperx" or "faster")
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// List recent jobs
    Jobs {
        /// Maximum number of jobs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show one job in detail
    Job {
        /// Job id
        id: i64,
    },

    /// Show resolved configuration (secrets elided)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;
        match self.command {
            Commands::Run => run_engine(settings).await,
            Commands::Transcribe {
                input,
                language,
                model,
                backend,
            } => transcribe_local(settings, input, language, model, backend).await,
            Commands::Jobs { limit } => list_jobs(settings, limit).await,
            Commands::Job { id } => show_job(settings, id).await,
            Commands::Config => show_config(settings),
        }
    }
}

/// Assemble the full engine and block until shutdown.
///
/// Shutdown fires on Ctrl-C or when the idle monitor resolves; the worker
/// task is cancelled either way, so an in-flight job is best-effort only.
async fn run_engine(settings: Settings) -> Result<()> {
    let info = SystemInfo::detect();
    info!("\n{}", format_startup_info(&info));

    let backend = choose_backend(settings.backend_override()?, info.has_accelerator());
    info!(backend = backend.name(), "Backend selected");

    let token = settings
        .bot_token
        .clone()
        .context("Bot token is required (set TRANSKRIPT_BOT_TOKEN)")?;
    let transport = Arc::new(TelegramClient::new(token, settings.api_base_url.clone()));
    let storage = Arc::new(Storage::open(&settings.storage_path)?);
    let converter = Arc::new(FfmpegConverter::new(settings.ffmpeg_cmd.clone()));
    let engine = Arc::new(WhisperEngine::new(backend, &settings));
    let activity = Arc::new(ActivityTracker::new());
    let settings = Arc::new(settings);

    let (queue, receiver) = job_queue();
    let worker = Worker::new(
        storage,
        transport,
        converter,
        engine,
        Arc::clone(&activity),
        Arc::clone(&settings),
        backend,
    );
    let worker_task = tokio::spawn(worker.run(receiver));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = idle_monitor(queue.clone(), activity, settings.idle_limit()) => {
            info!("Idle limit reached, shutting down");
        }
    }

    worker_task.abort();
    Ok(())
}

/// One-shot local pipeline: convert, transcribe, render, write artifacts
async fn transcribe_local(
    settings: Settings,
    input: PathBuf,
    language: Option<String>,
    model: Option<String>,
    backend: Option<String>,
) -> Result<()> {
    let forced = match backend {
        Some(name) => Some(name.parse::<Backend>()?),
        None => settings.backend_override()?,
    };
    let info = SystemInfo::detect();
    let backend = choose_backend(forced, info.has_accelerator());

    let mut options = TranscribeOptions::from_settings(&settings);
    if let Some(language) = language {
        options.language = language;
    }
    if let Some(model) = model {
        options.model = model;
    }

    let converter = FfmpegConverter::new(settings.ffmpeg_cmd.clone());
    let engine = WhisperEngine::new(backend, &settings);

    let work_dir = tempfile::tempdir().context("Failed to create working dir")?;
    let wav_path = work_dir.path().join("input.wav");

    info!(backend = backend.name(), input = %input.display(), "Transcribing");
    converter.convert_to_wav(&input, &wav_path).await?;
    let segments = engine.transcribe(&wav_path, &options).await?;
    let segments = normalize_segments(segments);

    let text = segments_to_txt(&segments);
    let json = segments_to_json(&segments)?;
    let txt_path = input.with_extension("txt");
    let md_path = input.with_extension("md");
    let json_path = input.with_extension("json");
    tokio::fs::write(&txt_path, &text).await?;
    tokio::fs::write(&md_path, &text).await?;
    tokio::fs::write(&json_path, &json).await?;

    print!("{text}");
    println!("---");
    println!("Wrote {}", txt_path.display());
    println!("Wrote {}", md_path.display());
    println!("Wrote {}", json_path.display());

    Ok(())
}

async fn list_jobs(settings: Settings, limit: usize) -> Result<()> {
    let storage = Storage::open(&settings.storage_path)?;
    let jobs = storage.recent_jobs(limit).await?;

    if jobs.is_empty() {
        println!("No jobs recorded");
        return Ok(());
    }

    for job in jobs {
        let duration = match (job.started_at, job.finished_at) {
            (Some(started), Some(finished)) => format!("{}s", (finished - started) as u64),
            _ => "-".to_string(),
        };
        println!(
            "#{:<5} {:<8} backend={:<9} duration={:<6} chat={} {}",
            job.id,
            job.status,
            job.backend.as_deref().unwrap_or("-"),
            duration,
            job.chat_id,
            job.error.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

async fn show_job(settings: Settings, id: i64) -> Result<()> {
    let storage = Storage::open(&settings.storage_path)?;
    let job = storage
        .job(id)
        .await?
        .with_context(|| format!("Job {id} not found"))?;

    println!("Job #{}", job.id);
    println!("  status:     {}", job.status);
    println!("  chat:       {}", job.chat_id);
    println!("  user:       {}", job.user_id);
    println!("  file:       {}", job.file_name.as_deref().unwrap_or("-"));
    println!("  backend:    {}", job.backend.as_deref().unwrap_or("-"));
    println!("  created:    {}", job.created_at);
    if let (Some(started), Some(finished)) = (job.started_at, job.finished_at) {
        println!("  duration:   {}s", (finished - started) as u64);
    }
    if let Some(error) = &job.error {
        println!("  error:      {error}");
    }
    if let Some(outputs) = &job.output_paths {
        println!("  outputs:    {outputs}");
    }

    Ok(())
}

fn show_config(settings: Settings) -> Result<()> {
    println!("storage_path:          {}", settings.storage_path.display());
    println!("media_dir:             {}", settings.media_dir.display());
    println!("idle_shutdown_minutes: {}", settings.idle_shutdown_minutes);
    println!("default_language:      {}", settings.default_language);
    println!("model:                 {}", settings.model);
    println!(
        "backend_force:         {}",
        settings.backend_force.as_deref().unwrap_or("(auto)")
    );
    println!("whisperx_cmd:          {}", settings.whisperx_cmd);
    println!("faster_whisper_cmd:    {}", settings.faster_whisper_cmd);
    println!("ffmpeg_cmd:            {}", settings.ffmpeg_cmd);
    println!(
        "bot_token:             {}",
        if settings.bot_token.is_some() { "(set)" } else { "(unset)" }
    );
    println!(
        "hf_token:              {}",
        if settings.hf_token.is_some() { "(set)" } else { "(unset)" }
    );
    Ok(())
}
