// crates/engine/src/queue.rs
//! In-process broker. Enqueue assigns a broker id and hands the descriptor
//! to whichever worker takes it next; depth is tracked for observability.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use taskmill_core::{JobDescriptor, JobId};

use crate::error::EngineError;

/// A descriptor the broker has accepted, tagged with its assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    pub job_id: JobId,
    pub descriptor: JobDescriptor,
}

/// Broker transport for job descriptors.
///
/// Cloneable handle; producers call [`enqueue`](Self::enqueue), workers share
/// the consumer end behind an async mutex so exactly one of them receives
/// each descriptor.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<QueuedJob>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
    depth: Arc<AtomicUsize>,
}

impl JobQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            depth: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Accept a descriptor, assign it a broker id, and queue it for the
    /// workers. Never blocks; fails only if the engine has shut down.
    pub fn enqueue(&self, descriptor: JobDescriptor) -> Result<JobId, EngineError> {
        let job_id = Uuid::new_v4().to_string();
        let queued = QueuedJob {
            job_id: job_id.clone(),
            descriptor,
        };
        self.tx
            .send(queued)
            .map_err(|_| EngineError::QueueClosed)?;
        let depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::gauge!("taskmill_queue_depth").set(depth as f64);
        tracing::debug!(job_id = %job_id, depth, "Descriptor enqueued");
        Ok(job_id)
    }

    /// Wait for the next descriptor. Returns `None` once every producer is
    /// gone and the queue has drained.
    pub async fn dequeue(&self) -> Option<QueuedJob> {
        let mut rx = self.rx.lock().await;
        let job = rx.recv().await;
        if job.is_some() {
            self.note_removed();
        }
        job
    }

    /// Take a descriptor only if one is already waiting.
    pub async fn try_dequeue(&self) -> Option<QueuedJob> {
        let mut rx = self.rx.lock().await;
        let job = rx.try_recv().ok();
        if job.is_some() {
            self.note_removed();
        }
        job
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    fn note_removed(&self) {
        let depth = self.depth.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        metrics::gauge!("taskmill_queue_depth").set(depth as f64);
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use taskmill_core::JobType;

    fn descriptor() -> JobDescriptor {
        JobDescriptor::new(JobType::ProcessData, json!({"processing_time": 1}))
    }

    #[tokio::test]
    async fn test_enqueue_assigns_unique_broker_ids() {
        let queue = JobQueue::new();
        let a = queue.enqueue(descriptor()).unwrap();
        let b = queue.enqueue(descriptor()).unwrap();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert!(Uuid::parse_str(&b).is_ok());
    }

    #[tokio::test]
    async fn test_dequeue_is_fifo_and_tracks_depth() {
        let queue = JobQueue::new();
        let a = queue.enqueue(descriptor()).unwrap();
        let b = queue.enqueue(descriptor()).unwrap();
        assert_eq!(queue.depth(), 2);

        let first = queue.dequeue().await.unwrap();
        let second = queue.dequeue().await.unwrap();
        assert_eq!(first.job_id, a);
        assert_eq!(second.job_id, b);
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_try_dequeue_on_empty_queue() {
        let queue = JobQueue::new();
        assert!(queue.try_dequeue().await.is_none());

        queue.enqueue(descriptor()).unwrap();
        assert!(queue.try_dequeue().await.is_some());
        assert!(queue.try_dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_descriptor_survives_the_trip() {
        let queue = JobQueue::new();
        let sent = JobDescriptor::new(JobType::SimulateLoad, json!({"duration": 3}));
        let id = queue.enqueue(sent.clone()).unwrap();

        let got = queue.dequeue().await.unwrap();
        assert_eq!(got.job_id, id);
        assert_eq!(got.descriptor, sent);
    }
}
