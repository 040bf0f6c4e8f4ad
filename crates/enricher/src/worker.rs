//! Ingestion-queue consumer: deserializes decoded swaps, enriches them, and
//! routes strategy events. Failures bubble to the queue so its at-least-once
//! redelivery applies.

use crate::enrich::{EnrichOutcome, EventEnricher, SkipReason};
use crate::router::EventRouter;
use async_trait::async_trait;
use common::types::{DecodedSwapEvent, EnrichedSwapEvent, UsdClassification};
use queue::JobHandler;
use std::sync::Arc;
use tracing::{debug, info};

pub struct EnrichWorker {
    enricher: Arc<EventEnricher>,
    router: EventRouter,
}

impl EnrichWorker {
    pub fn new(enricher: Arc<EventEnricher>, router: EventRouter) -> Self {
        Self { enricher, router }
    }

    fn log_swap(event: &EnrichedSwapEvent) {
        info!(
            chain_id = %event.swap.chain_id,
            block = event.swap.block_number,
            pool = %event.swap.pool_address,
            dex = %event.dex_name,
            token0 = %event.token0.symbol,
            token0_amount = %event.token0.amount_formatted,
            token1 = %event.token1.symbol,
            token1_amount = %event.token1.amount_formatted,
            size_usd = ?event.classification.size_usd(),
            direction = ?event.direction,
            "swap detected"
        );
    }
}

#[async_trait]
impl JobHandler for EnrichWorker {
    async fn handle(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        let event: DecodedSwapEvent = serde_json::from_value(payload)?;
        match self.enricher.enrich(&event).await? {
            EnrichOutcome::Skipped(SkipReason::PoolNotFound) => {
                debug!(
                    chain_id = %event.chain_id,
                    pool = %event.pool_address,
                    "skipped, pool not found"
                );
                Ok(())
            }
            EnrichOutcome::Enriched(enriched) => {
                Self::log_swap(&enriched);
                // Unpriceable swaps are logged above but never routed.
                if enriched.classification != UsdClassification::Unclassified {
                    self.router.route(&enriched)?;
                }
                Ok(())
            }
        }
    }
}
