//! Connection and timing seams for the watcher. Production uses the
//! websocket JSON-RPC connector and the tokio clock; tests substitute both
//! so the reconnect state machine runs without sockets or real timers.

use async_trait::async_trait;
use common::errors::WatcherError;
use common::types::{BlockHeader, RawLog};
use std::time::Duration;

/// One live connection to a chain: a new-head subscription plus log fetches
/// over the same socket.
#[async_trait]
pub trait ChainConnection: Send {
    /// Waits for the next new-head notification. An error means the
    /// connection is lost and the watcher should enter its reconnect cycle.
    async fn next_block(&mut self) -> Result<BlockHeader, WatcherError>;

    /// Fetches the full log set of exactly one block.
    async fn fetch_logs(&mut self, block_number: u64) -> Result<Vec<RawLog>, WatcherError>;

    /// Unsubscribes and closes the socket. Safe to call more than once.
    async fn close(&mut self);
}

/// Establishes connections for a watcher.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn ChainConnection>, WatcherError>;
}

/// Timing seam for the reconnect delay.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock.
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
