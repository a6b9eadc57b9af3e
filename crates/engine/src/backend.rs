// crates/engine/src/backend.rs
//! Result backend: live and terminal execution state, keyed by job id.
//!
//! All state lives inside one holder task that owns the map; handles talk to
//! it over a command channel, so workers and readers never share memory.
//! Every applied update is mirrored onto a broadcast channel for streaming
//! consumers. Entries are pruned after a TTL measured from their last write.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;

use serde::Serialize;
use taskmill_core::{ExecutionState, JobId};

use crate::error::EngineError;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One applied state transition, as mirrored to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct StateUpdate {
    pub job_id: JobId,
    #[serde(flatten)]
    pub state: ExecutionState,
}

enum BackendCommand {
    Record {
        job_id: JobId,
        state: ExecutionState,
    },
    Get {
        job_id: JobId,
        reply: oneshot::Sender<Option<ExecutionState>>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
}

/// Cloneable handle to the state-holder task.
#[derive(Clone)]
pub struct ResultBackend {
    tx: mpsc::UnboundedSender<BackendCommand>,
    events: broadcast::Sender<StateUpdate>,
}

impl ResultBackend {
    /// Spawn the holder task. It runs until the last handle is dropped.
    pub fn spawn(result_ttl: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let events_for_holder = events.clone();
        tokio::spawn(run_holder(rx, events_for_holder, result_ttl));
        Self { tx, events }
    }

    /// Overwrite the execution state for a job. Last write wins; each job has
    /// exactly one worker, so writes for one id never race.
    pub fn record(&self, job_id: &str, state: ExecutionState) -> Result<(), EngineError> {
        self.tx
            .send(BackendCommand::Record {
                job_id: job_id.to_string(),
                state,
            })
            .map_err(|_| EngineError::BackendClosed)
    }

    /// Current state for a job, `None` if the backend has never seen the id
    /// (or has already pruned it).
    pub async fn get(&self, job_id: &str) -> Result<Option<ExecutionState>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BackendCommand::Get {
                job_id: job_id.to_string(),
                reply,
            })
            .map_err(|_| EngineError::BackendClosed)?;
        rx.await.map_err(|_| EngineError::BackendClosed)
    }

    /// Number of ids currently held.
    pub async fn len(&self) -> Result<usize, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BackendCommand::Len { reply })
            .map_err(|_| EngineError::BackendClosed)?;
        rx.await.map_err(|_| EngineError::BackendClosed)
    }

    /// Subscribe to applied state transitions. Slow subscribers miss events
    /// rather than blocking writers.
    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.events.subscribe()
    }
}

struct Entry {
    state: ExecutionState,
    touched: Instant,
}

async fn run_holder(
    mut rx: mpsc::UnboundedReceiver<BackendCommand>,
    events: broadcast::Sender<StateUpdate>,
    result_ttl: Duration,
) {
    let mut entries: HashMap<JobId, Entry> = HashMap::new();
    let prune_every = result_ttl.clamp(Duration::from_secs(1), Duration::from_secs(60));
    let mut prune_tick = tokio::time::interval(prune_every);
    prune_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(BackendCommand::Record { job_id, state }) => {
                    let update = StateUpdate {
                        job_id: job_id.clone(),
                        state: state.clone(),
                    };
                    entries.insert(
                        job_id,
                        Entry {
                            state,
                            touched: Instant::now(),
                        },
                    );
                    // No subscribers is the normal idle case.
                    let _ = events.send(update);
                }
                Some(BackendCommand::Get { job_id, reply }) => {
                    let _ = reply.send(entries.get(&job_id).map(|e| e.state.clone()));
                }
                Some(BackendCommand::Len { reply }) => {
                    let _ = reply.send(entries.len());
                }
                None => break,
            },
            _ = prune_tick.tick() => {
                let before = entries.len();
                entries.retain(|_, e| e.touched.elapsed() < result_ttl);
                let pruned = before - entries.len();
                if pruned > 0 {
                    tracing::debug!(pruned, remaining = entries.len(), "Pruned expired execution state");
                }
            }
        }
    }

    tracing::debug!("Result backend holder stopped");
}
