//! In-memory collaborator implementations, used for wiring the binary before
//! real backends exist and as test doubles across the workspace.

use crate::traits::{BalanceRepository, Notifier, OrderRepository, PoolCatalog};
use crate::types::{Address, BalanceRecord, ChainId, Order, Pool};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Pool catalog backed by a concurrent map.
#[derive(Default)]
pub struct InMemoryCatalog {
    pools: DashMap<(Address, ChainId), Pool>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
        }
    }

    pub fn add_pool(&self, pool: Pool) {
        self.pools
            .insert((pool.pool_address.clone(), pool.chain_id), pool);
    }
}

#[async_trait]
impl PoolCatalog for InMemoryCatalog {
    async fn find_pool_by_address(
        &self,
        address: &Address,
        chain_id: ChainId,
    ) -> Result<Option<Pool>> {
        Ok(self
            .pools
            .get(&(address.clone(), chain_id))
            .map(|p| p.value().clone()))
    }

    async fn find_pools_by_strategy(&self, strategy_id: &str) -> Result<Vec<Pool>> {
        Ok(self
            .pools
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .strategy
                    .as_ref()
                    .is_some_and(|s| s.id == strategy_id)
            })
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// Balance records keyed by (token address, chain).
#[derive(Default)]
pub struct InMemoryBalances {
    records: DashMap<(Address, ChainId), BalanceRecord>,
}

impl InMemoryBalances {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

#[async_trait]
impl BalanceRepository for InMemoryBalances {
    async fn find(&self, address: &Address, chain_id: ChainId) -> Result<Option<BalanceRecord>> {
        Ok(self
            .records
            .get(&(address.clone(), chain_id))
            .map(|r| r.value().clone()))
    }

    async fn upsert(&self, record: BalanceRecord) -> Result<()> {
        self.records
            .insert((record.address.clone(), record.chain_id), record);
        Ok(())
    }
}

/// Order store keyed by order id.
#[derive(Default)]
pub struct InMemoryOrders {
    orders: DashMap<Uuid, Order>,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<Order> {
        self.orders.get(id).map(|o| o.value().clone())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn create(&self, order: &Order) -> Result<()> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn save(&self, order: &Order) -> Result<()> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }
}

/// Captures notifications for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PoolToken, StrategyRef};

    fn pool(address: &str, strategy: Option<&str>) -> Pool {
        Pool {
            id: address.to_string(),
            pool_address: Address::from(address),
            chain_id: ChainId(1),
            token0: PoolToken {
                symbol: "USDC".to_string(),
                address: Address::from("0xa"),
                decimals: Some(6),
                stable: true,
            },
            token1: PoolToken {
                symbol: "WETH".to_string(),
                address: Address::from("0xb"),
                decimals: Some(18),
                stable: false,
            },
            dex_name: "uniswap".to_string(),
            fee: Some(3000),
            strategy: strategy.map(|id| StrategyRef {
                id: id.to_string(),
                kind: "dd".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_catalog_lookup_and_strategy_filter() {
        let catalog = InMemoryCatalog::new();
        catalog.add_pool(pool("0x1", Some("s1")));
        catalog.add_pool(pool("0x2", Some("s1")));
        catalog.add_pool(pool("0x3", None));

        let found = catalog
            .find_pool_by_address(&Address::from("0x1"), ChainId(1))
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = catalog
            .find_pool_by_address(&Address::from("0x1"), ChainId(2))
            .await
            .unwrap();
        assert!(missing.is_none());

        let pools = catalog.find_pools_by_strategy("s1").await.unwrap();
        assert_eq!(pools.len(), 2);
    }

    #[tokio::test]
    async fn test_balance_upsert_overwrites() {
        let balances = InMemoryBalances::new();
        let mut record = BalanceRecord {
            address: Address::from("0xa"),
            chain_id: ChainId(1),
            balance: "100".to_string(),
            allowance: Some("500".to_string()),
            decimals: 6,
        };
        balances.upsert(record.clone()).await.unwrap();
        record.balance = "250".to_string();
        balances.upsert(record).await.unwrap();

        let found = balances
            .find(&Address::from("0xA"), ChainId(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.balance, "250");
    }
}
