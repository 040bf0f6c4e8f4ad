//! One chain's watcher: a supervising task that owns the socket lifecycle,
//! pulls logs for every announced block, and feeds decoded swaps into the
//! ingestion queue. Blocks missed while the connection is down are lost;
//! there is no historical backfill.

use crate::connector::{ChainConnection, ChainConnector, Scheduler};
use crate::decode::decode_block_logs;
use chrono::Utc;
use common::errors::WatcherError;
use common::types::{BlockHeader, ChainId};
use queue::{QueueRegistry, BLOCK_EVENTS_QUEUE};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Lifecycle of one chain subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Active,
    Reconnecting,
    /// Fatal: the reconnect bound was exhausted. Requires external
    /// reconfiguration (remove and re-add the chain).
    Stopped,
}

/// Fixed-delay reconnect policy.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: 5,
        }
    }
}

/// Watcher for a single chain. Exactly one live subscription exists per
/// chain id; the registry in [`crate::service`] enforces that.
pub struct ChainWatcher {
    chain_id: ChainId,
    url: String,
    connector: Arc<dyn ChainConnector>,
    scheduler: Arc<dyn Scheduler>,
    queues: Arc<QueueRegistry>,
    policy: ReconnectPolicy,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChainWatcher {
    pub fn new(
        chain_id: ChainId,
        url: impl Into<String>,
        connector: Arc<dyn ChainConnector>,
        scheduler: Arc<dyn Scheduler>,
        queues: Arc<QueueRegistry>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            chain_id,
            url: url.into(),
            connector,
            scheduler,
            queues,
            policy,
            state_tx,
            state_rx,
            shutdown: None,
            task: None,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == ConnectionState::Active
    }

    /// Watch-channel view of the state machine, for status endpoints and
    /// tests.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Connects and spawns the supervising task. Calling `start` while the
    /// watcher is already running is a warning-level no-op.
    pub async fn start(&mut self) -> Result<(), WatcherError> {
        if matches!(
            self.state(),
            ConnectionState::Active | ConnectionState::Connecting | ConnectionState::Reconnecting
        ) {
            warn!(chain_id = %self.chain_id, "watcher already running, start ignored");
            return Ok(());
        }

        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(WatcherError::InvalidUrl(self.url.clone()));
        }

        let _ = self.state_tx.send(ConnectionState::Connecting);
        let conn = match self.connector.connect(&self.url).await {
            Ok(conn) => conn,
            Err(e) => {
                let _ = self.state_tx.send(ConnectionState::Disconnected);
                return Err(e);
            }
        };
        let _ = self.state_tx.send(ConnectionState::Active);
        info!(chain_id = %self.chain_id, url = %self.url, "watcher started");

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        self.shutdown = Some(shutdown_tx);
        self.task = Some(tokio::spawn(run_loop(
            self.chain_id,
            self.url.clone(),
            conn,
            self.connector.clone(),
            self.scheduler.clone(),
            self.queues.clone(),
            self.policy,
            self.state_tx.clone(),
            shutdown_rx,
        )));
        Ok(())
    }

    /// Unsubscribes and closes the socket. Idempotent: a second call finds
    /// nothing to do.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(()).await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!(chain_id = %self.chain_id, "watcher stopped");
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    chain_id: ChainId,
    url: String,
    mut conn: Box<dyn ChainConnection>,
    connector: Arc<dyn ChainConnector>,
    scheduler: Arc<dyn Scheduler>,
    queues: Arc<QueueRegistry>,
    policy: ReconnectPolicy,
    state_tx: watch::Sender<ConnectionState>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut attempts: u32 = 0;
    'run: loop {
        // Drain the live subscription until shutdown or a socket error.
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    conn.close().await;
                    let _ = state_tx.send(ConnectionState::Disconnected);
                    return;
                }
                block = conn.next_block() => match block {
                    Ok(header) => {
                        process_block(chain_id, conn.as_mut(), &header, &queues).await;
                    }
                    Err(e) => {
                        warn!(chain_id = %chain_id, error = %e, "subscription lost");
                        break;
                    }
                }
            }
        }
        conn.close().await;

        // Reconnect cycle: fixed delay, bounded attempts, then fatal.
        loop {
            attempts += 1;
            if attempts > policy.max_attempts {
                let _ = state_tx.send(ConnectionState::Stopped);
                error!(
                    chain_id = %chain_id,
                    error = %WatcherError::AttemptsExhausted { attempts: policy.max_attempts },
                    "watcher stopped, chain requires reconfiguration"
                );
                return;
            }
            let _ = state_tx.send(ConnectionState::Reconnecting);
            warn!(
                chain_id = %chain_id,
                attempt = attempts,
                max_attempts = policy.max_attempts,
                "reconnecting"
            );
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    let _ = state_tx.send(ConnectionState::Disconnected);
                    return;
                }
                _ = scheduler.sleep(policy.delay) => {}
            }
            let _ = state_tx.send(ConnectionState::Connecting);
            match connector.connect(&url).await {
                Ok(new_conn) => {
                    conn = new_conn;
                    attempts = 0;
                    let _ = state_tx.send(ConnectionState::Active);
                    info!(chain_id = %chain_id, "reconnected");
                    continue 'run;
                }
                Err(e) => {
                    warn!(chain_id = %chain_id, error = %e, "reconnect attempt failed");
                }
            }
        }
    }
}

/// Fetches and decodes one block's logs. A failed fetch loses exactly that
/// block; the subscription itself stays up.
async fn process_block(
    chain_id: ChainId,
    conn: &mut dyn ChainConnection,
    header: &BlockHeader,
    queues: &QueueRegistry,
) {
    let logs = match conn.fetch_logs(header.number).await {
        Ok(logs) => logs,
        Err(e) => {
            warn!(
                chain_id = %chain_id,
                block = header.number,
                error = %e,
                "failed to fetch logs, block skipped"
            );
            return;
        }
    };

    let events = decode_block_logs(chain_id, header, &logs, Utc::now());
    let swaps = events.len();
    for event in events {
        if let Err(e) = queues.publish(BLOCK_EVENTS_QUEUE, &event) {
            warn!(chain_id = %chain_id, error = %e, "failed to enqueue swap event");
        }
    }
    info!(
        chain_id = %chain_id,
        block = header.number,
        logs = logs.len(),
        swaps,
        "new block processed"
    );
}
