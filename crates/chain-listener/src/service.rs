//! Watcher registry: one watcher per configured chain, managed through the
//! control surface the REST layer consumes.

use crate::connector::{ChainConnector, Scheduler};
use crate::watcher::{ChainWatcher, ReconnectPolicy};
use common::types::{ChainId, ChainStatus};
use dashmap::DashMap;
use queue::QueueRegistry;
use std::sync::Arc;
use tracing::{info, warn};

/// Manages the chain watchers. Exactly one live watcher exists per chain id;
/// adding a chain that is already watched replaces its watcher.
pub struct ListenerService {
    watchers: DashMap<ChainId, ChainWatcher>,
    connector: Arc<dyn ChainConnector>,
    scheduler: Arc<dyn Scheduler>,
    queues: Arc<QueueRegistry>,
    policy: ReconnectPolicy,
}

impl ListenerService {
    pub fn new(
        connector: Arc<dyn ChainConnector>,
        scheduler: Arc<dyn Scheduler>,
        queues: Arc<QueueRegistry>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            watchers: DashMap::new(),
            connector,
            scheduler,
            queues,
            policy,
        }
    }

    /// Starts watching a chain. Returns whether the watcher connected and
    /// started; failures are logged, not propagated, so one bad endpoint
    /// cannot abort a batch configuration.
    pub async fn add_chain(&self, chain_id: ChainId, ws_url: &str) -> bool {
        if self.watchers.contains_key(&chain_id) {
            warn!(chain_id = %chain_id, "watcher already exists, replacing");
            self.remove_chain(chain_id).await;
        }

        let mut watcher = ChainWatcher::new(
            chain_id,
            ws_url,
            self.connector.clone(),
            self.scheduler.clone(),
            self.queues.clone(),
            self.policy,
        );
        match watcher.start().await {
            Ok(()) => {
                self.watchers.insert(chain_id, watcher);
                info!(chain_id = %chain_id, url = ws_url, "chain added");
                true
            }
            Err(e) => {
                warn!(chain_id = %chain_id, error = %e, "failed to add chain");
                false
            }
        }
    }

    /// Stops and removes a chain's watcher. Returns false when the chain was
    /// not being watched.
    pub async fn remove_chain(&self, chain_id: ChainId) -> bool {
        let Some((_, mut watcher)) = self.watchers.remove(&chain_id) else {
            warn!(chain_id = %chain_id, "no watcher to remove");
            return false;
        };
        watcher.stop().await;
        info!(chain_id = %chain_id, "chain removed");
        true
    }

    /// Stops and re-adds a chain under its existing endpoint. This is the
    /// recovery path for a watcher that went `Stopped`.
    pub async fn restart_chain(&self, chain_id: ChainId) -> bool {
        let Some(url) = self
            .watchers
            .get(&chain_id)
            .map(|w| w.url().to_string())
        else {
            warn!(chain_id = %chain_id, "no configuration to restart");
            return false;
        };
        self.remove_chain(chain_id).await;
        self.add_chain(chain_id, &url).await
    }

    /// Bootstraps watchers for every configured chain.
    pub async fn configure_chains(&self, chains: &[(ChainId, String)]) {
        for (chain_id, url) in chains {
            self.add_chain(*chain_id, url).await;
        }
    }

    /// One status row per configured chain.
    pub fn status(&self) -> Vec<ChainStatus> {
        self.watchers
            .iter()
            .map(|entry| ChainStatus {
                chain_id: *entry.key(),
                rpc_url: entry.value().url().to_string(),
                active: entry.value().is_active(),
            })
            .collect()
    }

    pub async fn stop_all(&self) {
        let chain_ids: Vec<ChainId> = self.watchers.iter().map(|e| *e.key()).collect();
        for chain_id in chain_ids {
            self.remove_chain(chain_id).await;
        }
        info!("all watchers stopped");
    }
}
