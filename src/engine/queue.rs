//! FIFO job queue decoupling submission from processing.
//!
//! An unbounded channel: arbitrarily many producer handles, exactly one
//! consumer. Insertion order is processing order: no priority, no
//! deduplication. The queue holds no job state beyond the descriptors
//! themselves; the store remains the source of truth.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::JobRequest;

/// Create a connected producer/consumer pair
pub fn job_queue() -> (JobQueue, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        JobQueue {
            tx,
            depth: Arc::clone(&depth),
        },
        JobReceiver { rx, depth },
    )
}

/// Cloneable producer handle, shared across submission handlers
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<JobRequest>,
    depth: Arc<AtomicUsize>,
}

impl JobQueue {
    /// Append a descriptor to the tail. Never blocks, never rejects; the
    /// send only fails once the consumer is gone at shutdown.
    pub fn enqueue(&self, job: JobRequest) {
        let id = job.id;
        if self.tx.send(job).is_ok() {
            self.depth.fetch_add(1, Ordering::SeqCst);
        } else {
            warn!(job_id = id, "Job queue consumer is gone; descriptor dropped");
        }
    }

    /// Number of descriptors not yet dequeued
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Single consumer handle held by the worker loop
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<JobRequest>,
    depth: Arc<AtomicUsize>,
}

impl JobReceiver {
    /// Wait for the oldest unconsumed descriptor. Returns `None` once all
    /// producer handles are dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<JobRequest> {
        let job = self.rx.recv().await;
        if job.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: i64) -> JobRequest {
        JobRequest {
            id,
            chat_id: 1,
            thread_id: None,
            message_id: 10,
            file_ref: format!("file-{id}"),
            file_name: None,
            status_message_id: None,
        }
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, mut receiver) = job_queue();

        for id in 1..=3 {
            queue.enqueue(request(id));
        }

        for expected in 1..=3 {
            let job = receiver.recv().await.unwrap();
            assert_eq!(job.id, expected);
        }
    }

    #[tokio::test]
    async fn test_depth_tracks_pending_count() {
        let (queue, mut receiver) = job_queue();
        assert!(queue.is_empty());

        queue.enqueue(request(1));
        queue.enqueue(request(2));
        assert_eq!(queue.len(), 2);

        receiver.recv().await.unwrap();
        assert_eq!(queue.len(), 1);

        receiver.recv().await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_producers_dropped() {
        let (queue, mut receiver) = job_queue();
        queue.enqueue(request(1));
        drop(queue);

        assert!(receiver.recv().await.is_some());
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cloned_producers_share_depth() {
        let (queue, _receiver) = job_queue();
        let other = queue.clone();

        queue.enqueue(request(1));
        other.enqueue(request(2));

        assert_eq!(queue.len(), 2);
        assert_eq!(other.len(), 2);
    }
}
