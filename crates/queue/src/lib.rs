//! Named logical job queues with at-least-once delivery.
//!
//! One ingestion queue feeds the enrichment workers; one queue per strategy
//! type feeds its scanner. Queues are created on first use, live for the
//! process lifetime, and are closed together on shutdown. A consumer that
//! fails a job sees it retried up to a bounded number of attempts; a job that
//! exhausts its attempts is parked for inspection instead of being dropped.

use common::errors::QueueError;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Queue carrying decoded swap events from the watchers to the enrichers.
pub const BLOCK_EVENTS_QUEUE: &str = "block-events";

/// Routing queue for one strategy type.
pub fn strategy_queue_name(strategy_kind: &str) -> String {
    format!("strategy-{strategy_kind}")
}

/// A unit of work: an opaque JSON payload plus delivery bookkeeping.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    pub queue: String,
    pub payload: serde_json::Value,
}

/// A job that exhausted its consumer attempts, retained for inspection.
#[derive(Debug, Clone)]
pub struct DeadJob {
    pub job: Job,
    pub attempts: u32,
    pub last_error: String,
}

/// Processes one job. Returning `Err` triggers redelivery up to the
/// registry's attempt bound.
#[async_trait::async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: serde_json::Value) -> anyhow::Result<()>;
}

struct QueueChannel {
    tx: mpsc::UnboundedSender<Job>,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>,
}

/// Registry of named queues. Creation happens on first use behind a
/// concurrent map; `close_all` drops every sender so consumer loops drain and
/// exit on their own.
pub struct QueueRegistry {
    queues: DashMap<String, QueueChannel>,
    max_attempts: u32,
    next_job_id: AtomicU64,
    closed: AtomicBool,
    dead_letters: Mutex<Vec<DeadJob>>,
}

impl QueueRegistry {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            queues: DashMap::new(),
            max_attempts: max_attempts.max(1),
            next_job_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            dead_letters: Mutex::new(Vec::new()),
        }
    }

    fn channel(&self, name: &str) -> dashmap::mapref::one::Ref<'_, String, QueueChannel> {
        self.queues
            .entry(name.to_string())
            .or_insert_with(|| {
                info!(queue = name, "created queue");
                let (tx, rx) = mpsc::unbounded_channel();
                QueueChannel {
                    tx,
                    rx: Arc::new(tokio::sync::Mutex::new(rx)),
                }
            })
            .downgrade()
    }

    /// Serializes and enqueues a payload.
    pub fn publish<T: Serialize>(&self, queue: &str, payload: &T) -> Result<(), QueueError> {
        let value =
            serde_json::to_value(payload).map_err(|e| QueueError::Serialize(e.to_string()))?;
        self.publish_value(queue, value)
    }

    pub fn publish_value(&self, queue: &str, payload: serde_json::Value) -> Result<(), QueueError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed(queue.to_string()));
        }
        let job = Job {
            id: self.next_job_id.fetch_add(1, Ordering::Relaxed),
            queue: queue.to_string(),
            payload,
        };
        self.channel(queue)
            .tx
            .send(job)
            .map_err(|_| QueueError::Closed(queue.to_string()))
    }

    /// Spawns `workers` consumer loops draining `queue` through `handler`.
    /// Each worker exits when the queue is closed and drained.
    pub fn spawn_consumers(
        self: &Arc<Self>,
        queue: &str,
        workers: usize,
        handler: Arc<dyn JobHandler>,
    ) -> Vec<JoinHandle<()>> {
        let rx = self.channel(queue).rx.clone();
        (0..workers.max(1))
            .map(|worker| {
                let registry = Arc::clone(self);
                let rx = Arc::clone(&rx);
                let handler = Arc::clone(&handler);
                let queue = queue.to_string();
                tokio::spawn(async move {
                    loop {
                        let job = { rx.lock().await.recv().await };
                        let Some(job) = job else {
                            debug!(queue = %queue, worker, "queue closed, consumer exiting");
                            break;
                        };
                        registry.process(job, handler.as_ref()).await;
                    }
                })
            })
            .collect()
    }

    async fn process(&self, job: Job, handler: &dyn JobHandler) {
        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            match handler.handle(job.payload.clone()).await {
                Ok(()) => return,
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        queue = %job.queue,
                        job_id = job.id,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %last_error,
                        "job attempt failed"
                    );
                }
            }
        }
        self.dead_letters.lock().unwrap().push(DeadJob {
            attempts: self.max_attempts,
            last_error,
            job,
        });
    }

    /// Jobs that exhausted their attempts.
    pub fn dead_letters(&self) -> Vec<DeadJob> {
        self.dead_letters.lock().unwrap().clone()
    }

    pub fn queue_names(&self) -> Vec<String> {
        self.queues.iter().map(|e| e.key().clone()).collect()
    }

    /// Closes every queue. Publishing afterwards fails; consumers drain
    /// whatever is already enqueued and then exit.
    pub fn close_all(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let names: Vec<String> = self.queues.iter().map(|e| e.key().clone()).collect();
        for name in names {
            if self.queues.remove(&name).is_some() {
                info!(queue = %name, "closed queue");
            }
        }
    }
}
