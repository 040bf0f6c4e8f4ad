//! Forwards enriched events into per-strategy queues. Queues are created by
//! the registry on first use and closed by its shutdown close-all; the
//! router itself adds no retry logic on top of the transport's.

use common::errors::QueueError;
use common::types::EnrichedSwapEvent;
use queue::{strategy_queue_name, QueueRegistry};
use std::sync::Arc;
use tracing::info;

pub struct EventRouter {
    queues: Arc<QueueRegistry>,
}

impl EventRouter {
    pub fn new(queues: Arc<QueueRegistry>) -> Self {
        Self { queues }
    }

    /// Publishes the event to its strategy's queue. Returns whether the
    /// event was routed; events without a strategy are not.
    pub fn route(&self, event: &EnrichedSwapEvent) -> Result<bool, QueueError> {
        let Some(strategy) = &event.strategy else {
            return Ok(false);
        };
        let queue_name = strategy_queue_name(&strategy.kind);
        self.queues.publish(&queue_name, event)?;
        info!(
            queue = %queue_name,
            pool = %event.swap.pool_address,
            size_usd = ?event.classification.size_usd(),
            "routed swap to strategy queue"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::types::{
        Address, ChainId, DecodedSwapEvent, DexProtocol, EnrichedToken, StrategyRef,
        UsdClassification,
    };

    fn enriched(strategy: Option<StrategyRef>) -> EnrichedSwapEvent {
        let token = EnrichedToken {
            symbol: "USDC".to_string(),
            address: Address::from("0xusdc"),
            decimals: 6,
            stable: true,
            amount: "1".to_string(),
            amount_formatted: "0.000001".to_string(),
        };
        EnrichedSwapEvent {
            swap: DecodedSwapEvent {
                chain_id: ChainId(1),
                block_number: 1,
                block_hash: "0x0".to_string(),
                block_timestamp: 0,
                observed_at: Utc::now(),
                pool_address: Address::from("0xpool"),
                sender_address: Address::from("0xsender"),
                token0_amount: "1".to_string(),
                token1_amount: "-1".to_string(),
                protocol: DexProtocol::UniswapV2,
                sqrt_price: None,
            },
            pool_id: "p".to_string(),
            dex_name: "d".to_string(),
            fee: None,
            token0: token.clone(),
            token1: token,
            classification: UsdClassification::Unclassified,
            direction: None,
            strategy,
        }
    }

    #[tokio::test]
    async fn test_routes_only_strategy_events() {
        let queues = Arc::new(QueueRegistry::new(3));
        let router = EventRouter::new(queues.clone());

        let routed = router
            .route(&enriched(Some(StrategyRef {
                id: "s1".to_string(),
                kind: "dd".to_string(),
            })))
            .unwrap();
        assert!(routed);
        assert!(queues.queue_names().contains(&"strategy-dd".to_string()));

        let unrouted = router.route(&enriched(None)).unwrap();
        assert!(!unrouted);
        assert_eq!(queues.queue_names().len(), 1);
    }
}
