//! Collaborator seams. Persistence, quoting, execution, and notification all
//! live behind these traits; the core never talks to a database or an
//! external API directly.

use crate::types::{
    Address, BalanceRecord, ChainId, Order, Pool, Quote, QuoteRequest, SwapExecution, SwapRequest,
};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Read access to the token/pool catalog.
#[async_trait]
pub trait PoolCatalog: Send + Sync {
    /// Resolves a pool by its on-chain address and chain. `None` is a normal
    /// outcome, not an error.
    async fn find_pool_by_address(&self, address: &Address, chain_id: ChainId)
        -> Result<Option<Pool>>;

    /// All pools belonging to a strategy.
    async fn find_pools_by_strategy(&self, strategy_id: &str) -> Result<Vec<Pool>>;
}

/// Spot-price oracle for native/major assets, quoted in USD.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn get_price(&self, symbol: &str) -> Result<Decimal>;
}

/// The external DEX-aggregator API: quoting and swap execution.
#[async_trait]
pub trait DexAggregator: Send + Sync {
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote>;

    async fn execute_swap(&self, request: &SwapRequest) -> Result<SwapExecution>;
}

/// Stored balance/allowance records, keyed by (token address, chain).
/// Reads and writes are non-transactional.
#[async_trait]
pub trait BalanceRepository: Send + Sync {
    async fn find(&self, address: &Address, chain_id: ChainId) -> Result<Option<BalanceRecord>>;

    async fn upsert(&self, record: BalanceRecord) -> Result<()>;
}

/// Order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &Order) -> Result<()>;

    async fn save(&self, order: &Order) -> Result<()>;
}

/// Best-effort message delivery. Failures are logged by callers and never
/// fail the operation that produced the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Read capabilities of one chain's RPC client. Quoting and signing stay
/// behind [`DexAggregator`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn native_balance(&self, wallet: &Address) -> Result<String>;

    async fn token_balance(&self, token: &Address, wallet: &Address) -> Result<String>;

    async fn token_decimals(&self, token: &Address) -> Result<u32>;
}

/// Concurrency-safe registry of chain clients keyed by chain id, populated
/// from configuration at startup.
#[derive(Default)]
pub struct ChainClientRegistry {
    clients: DashMap<ChainId, Arc<dyn ChainClient>>,
}

impl ChainClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    pub fn register(&self, chain_id: ChainId, client: Arc<dyn ChainClient>) {
        self.clients.insert(chain_id, client);
    }

    pub fn get(&self, chain_id: ChainId) -> Result<Arc<dyn ChainClient>> {
        self.clients
            .get(&chain_id)
            .map(|c| c.value().clone())
            .ok_or_else(|| anyhow::anyhow!("no chain client registered for chain {}", chain_id))
    }

    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.clients.iter().map(|e| *e.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClient;

    #[async_trait]
    impl ChainClient for FixedClient {
        async fn native_balance(&self, _wallet: &Address) -> Result<String> {
            Ok("0".to_string())
        }

        async fn token_balance(&self, _token: &Address, _wallet: &Address) -> Result<String> {
            Ok("42".to_string())
        }

        async fn token_decimals(&self, _token: &Address) -> Result<u32> {
            Ok(18)
        }
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let registry = ChainClientRegistry::new();
        registry.register(ChainId(1), Arc::new(FixedClient));

        let client = registry.get(ChainId(1)).unwrap();
        let balance = client
            .token_balance(&Address::from("0xt"), &Address::from("0xw"))
            .await
            .unwrap();
        assert_eq!(balance, "42");

        assert!(registry.get(ChainId(2)).is_err());
    }
}
