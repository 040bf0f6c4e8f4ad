//! Strategy-queue consumer: feeds routed swap events into the scanner and
//! logs the outcome of every scan.

use crate::scanner::{ScanOutcome, SpreadScanner};
use async_trait::async_trait;
use common::types::EnrichedSwapEvent;
use queue::JobHandler;
use std::sync::Arc;

pub struct ScanWorker {
    scanner: Arc<SpreadScanner>,
}

impl ScanWorker {
    pub fn new(scanner: Arc<SpreadScanner>) -> Self {
        Self { scanner }
    }
}

#[async_trait]
impl JobHandler for ScanWorker {
    async fn handle(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        let event: EnrichedSwapEvent = serde_json::from_value(payload)?;
        let outcome = self.scanner.scan(&event).await?;
        match &outcome {
            ScanOutcome::Profitable { best, confirmed } => {
                log::info!(
                    "profitable spread on pool {}: {} confirmed at {} (spread_usd {})",
                    best.pool_address,
                    best.spread_percent,
                    confirmed.spread_percent,
                    confirmed.spread_usd
                );
            }
            ScanOutcome::NotProfitable { best, confirmed } => {
                log::info!(
                    "best spread {} on pool {} not profitable (confirmed: {:?})",
                    best.spread_percent,
                    best.pool_address,
                    confirmed.as_ref().map(|c| c.spread_percent)
                );
            }
            ScanOutcome::NoValidQuotes => {
                log::warn!(
                    "no valid quotes for event on pool {}",
                    event.swap.pool_address
                );
            }
            outcome => {
                log::debug!(
                    "scan skipped for pool {}: {outcome:?}",
                    event.swap.pool_address
                );
            }
        }
        Ok(())
    }
}
