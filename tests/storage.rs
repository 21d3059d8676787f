//! Job Store Integration Tests

use transkript::domain::{JobStatus, NewJob};
use transkript::storage::Storage;

fn new_job(user_id: i64) -> NewJob {
    NewJob {
        chat_id: 10,
        user_id,
        message_id: user_id,
        thread_id: None,
        file_ref: format!("file-{user_id}"),
        file_name: Some("audio.mp3".to_string()),
        duration_sec: Some(33.0),
        status_message_id: Some(500),
    }
}

#[tokio::test]
async fn test_create_starts_queued_with_monotonic_ids() {
    let storage = Storage::open_in_memory().unwrap();

    let first = storage.create_job(&new_job(1)).await.unwrap();
    let second = storage.create_job(&new_job(2)).await.unwrap();
    assert!(second > first);

    let job = storage.job(first).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.chat_id, 10);
    assert_eq!(job.file_name.as_deref(), Some("audio.mp3"));
    assert!(job.started_at.is_none());
    assert!(job.error.is_none());
}

#[tokio::test]
async fn test_lifecycle_transitions_set_fields_atomically() {
    let storage = Storage::open_in_memory().unwrap();
    let id = storage.create_job(&new_job(1)).await.unwrap();

    storage.mark_running(id, 100.0, "faster").await.unwrap();
    let job = storage.job(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.started_at, Some(100.0));
    assert_eq!(job.backend.as_deref(), Some("faster"));

    storage
        .mark_done(id, 145.0, r#"{"txt":"1.txt"}"#)
        .await
        .unwrap();
    let job = storage.job(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.finished_at, Some(145.0));
    assert!(job.output_paths.unwrap().contains("1.txt"));
}

#[tokio::test]
async fn test_failed_jobs_carry_error_text() {
    let storage = Storage::open_in_memory().unwrap();
    let id = storage.create_job(&new_job(1)).await.unwrap();

    storage.mark_running(id, 100.0, "whisperx").await.unwrap();
    storage.mark_failed(id, "transcription failed: boom").await.unwrap();

    let job = storage.job(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("transcription failed: boom"));
}

#[tokio::test]
async fn test_duration_is_whole_seconds_of_processing_time() {
    let storage = Storage::open_in_memory().unwrap();
    let id = storage.create_job(&new_job(1)).await.unwrap();

    storage.mark_running(id, 10.0, "faster").await.unwrap();
    storage.mark_done(id, 25.0, "{}").await.unwrap();

    let durations = storage.recent_durations(5).await.unwrap();
    assert_eq!(durations, vec![15]);
}

#[tokio::test]
async fn test_recent_durations_only_counts_done_jobs() {
    let storage = Storage::open_in_memory().unwrap();

    let done = storage.create_job(&new_job(1)).await.unwrap();
    storage.mark_running(done, 0.0, "faster").await.unwrap();
    storage.mark_done(done, 60.0, "{}").await.unwrap();

    let failed = storage.create_job(&new_job(2)).await.unwrap();
    storage.mark_running(failed, 0.0, "faster").await.unwrap();
    storage.mark_failed(failed, "boom").await.unwrap();

    // Queued, never started
    storage.create_job(&new_job(3)).await.unwrap();

    let durations = storage.recent_durations(5).await.unwrap();
    assert_eq!(durations, vec![60]);
}

#[tokio::test]
async fn test_recent_durations_limit_and_order() {
    let storage = Storage::open_in_memory().unwrap();

    // Three completed jobs finishing at 100, 200, 300 with durations 10/20/30
    for (start, finish) in [(90.0, 100.0), (180.0, 200.0), (270.0, 300.0)] {
        let id = storage.create_job(&new_job(1)).await.unwrap();
        storage.mark_running(id, start, "faster").await.unwrap();
        storage.mark_done(id, finish, "{}").await.unwrap();
    }

    // Most recently finished first
    let durations = storage.recent_durations(2).await.unwrap();
    assert_eq!(durations, vec![30, 20]);
}

#[tokio::test]
async fn test_recent_jobs_newest_first() {
    let storage = Storage::open_in_memory().unwrap();
    for user in 1..=3 {
        storage.create_job(&new_job(user)).await.unwrap();
    }

    let jobs = storage.recent_jobs(2).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs[0].id > jobs[1].id);
}

#[tokio::test]
async fn test_missing_job_is_none() {
    let storage = Storage::open_in_memory().unwrap();
    assert!(storage.job(424242).await.unwrap().is_none());
}
