//! Cross-pool spread detection. A routed swap event triggers a concurrent
//! quote fan-out across its strategy's pools; the best spread must survive a
//! confirmation re-quote before the scan reports it as profitable.

use anyhow::Result;
use common::traits::{DexAggregator, PoolCatalog};
use common::types::{
    ArbQuote, EnrichedSwapEvent, Pool, PoolToken, QuoteRequest, TradeDirection, UsdClassification,
};
use futures::future::join_all;
use rust_decimal::{Decimal, MathematicalOps};
use std::str::FromStr;
use std::sync::Arc;

/// Scanner thresholds.
#[derive(Debug, Clone)]
pub struct ScannerSettings {
    /// Swaps below this USD notional are ignored.
    pub min_swap_size_usd: Decimal,
    /// Profitability threshold as a fraction (20 bps = 0.002).
    pub spread_threshold: Decimal,
    /// Slippage passed through on scan quotes.
    pub quote_slippage: String,
}

impl ScannerSettings {
    pub fn from_bps(min_swap_size_usd: u64, spread_threshold_bps: u32) -> Self {
        Self {
            min_swap_size_usd: Decimal::from(min_swap_size_usd),
            spread_threshold: Decimal::new(spread_threshold_bps as i64, 4),
            quote_slippage: "0.5".to_string(),
        }
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self::from_bps(50, 20)
    }
}

/// Result of one scan. Every early exit is explicit; a bare boolean would
/// hide why nothing was traded.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// No USD size or direction could be derived from the event.
    SkippedUnclassified,
    BelowMinSize {
        size_usd: Decimal,
    },
    /// The event reached the scanner without a strategy attached.
    NoStrategy,
    /// The strategy has no pools besides the triggering one.
    NoCounterpartyPools,
    /// Every fan-out quote failed.
    NoValidQuotes,
    NotProfitable {
        best: ArbQuote,
        /// Present when the best candidate cleared the threshold but its
        /// confirmation re-quote did not.
        confirmed: Option<ArbQuote>,
    },
    Profitable {
        best: ArbQuote,
        confirmed: ArbQuote,
    },
}

pub struct SpreadScanner {
    catalog: Arc<dyn PoolCatalog>,
    aggregator: Arc<dyn DexAggregator>,
    settings: ScannerSettings,
}

impl SpreadScanner {
    pub fn new(
        catalog: Arc<dyn PoolCatalog>,
        aggregator: Arc<dyn DexAggregator>,
        settings: ScannerSettings,
    ) -> Self {
        Self {
            catalog,
            aggregator,
            settings,
        }
    }

    pub async fn scan(&self, event: &EnrichedSwapEvent) -> Result<ScanOutcome> {
        let (Some(size_usd), Some(direction)) =
            (event.classification.size_usd(), event.direction)
        else {
            return Ok(ScanOutcome::SkippedUnclassified);
        };
        if size_usd < self.settings.min_swap_size_usd {
            return Ok(ScanOutcome::BelowMinSize { size_usd });
        }
        let Some(strategy) = &event.strategy else {
            return Ok(ScanOutcome::NoStrategy);
        };

        let Some(sizing) = TriggerSizing::from_event(event) else {
            return Ok(ScanOutcome::SkippedUnclassified);
        };

        let pools = self.catalog.find_pools_by_strategy(&strategy.id).await?;
        let (trigger, others): (Vec<Pool>, Vec<Pool>) = pools.into_iter().partition(|p| {
            p.pool_address == event.swap.pool_address && p.chain_id == event.swap.chain_id
        });
        if others.is_empty() {
            return Ok(ScanOutcome::NoCounterpartyPools);
        }

        // Quote every other pool plus the triggering pool itself as the
        // price baseline, all in one concurrent fan-out.
        let mut candidates = others;
        candidates.extend(trigger);
        let quotes = join_all(
            candidates
                .iter()
                .map(|pool| self.quote_pool(pool, direction, &sizing, size_usd)),
        )
        .await;

        let best = quotes
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.as_ref().map(|q| (i, q.clone())))
            .max_by(|a, b| a.1.spread_percent.cmp(&b.1.spread_percent));
        let Some((best_index, best)) = best else {
            return Ok(ScanOutcome::NoValidQuotes);
        };

        if best.spread_percent <= self.settings.spread_threshold {
            return Ok(ScanOutcome::NotProfitable {
                best,
                confirmed: None,
            });
        }

        // Re-quote exactly the winning pool and direction: a single noisy
        // quote never triggers a trade decision.
        let confirmed = self
            .quote_pool(&candidates[best_index], direction, &sizing, size_usd)
            .await;
        match confirmed {
            Some(confirmed) if confirmed.spread_percent > self.settings.spread_threshold => {
                Ok(ScanOutcome::Profitable { best, confirmed })
            }
            Some(confirmed) => Ok(ScanOutcome::NotProfitable {
                best,
                confirmed: Some(confirmed),
            }),
            None => {
                log::warn!(
                    "confirmation quote failed for pool {}, treating as not profitable",
                    best.pool_address
                );
                Ok(ScanOutcome::NotProfitable {
                    best,
                    confirmed: None,
                })
            }
        }
    }

    /// Requests one quote sized to the trigger notional. `None` excludes the
    /// candidate from the comparison; only a full-fan-out failure aborts the
    /// scan.
    async fn quote_pool(
        &self,
        pool: &Pool,
        direction: TradeDirection,
        sizing: &TriggerSizing,
        size_usd: Decimal,
    ) -> Option<ArbQuote> {
        let (reference, non_reference) = split_sides(pool, &sizing.reference_symbol)?;
        let (from, to, human_in) = match direction {
            TradeDirection::Buy => (reference, non_reference, sizing.reference_human),
            TradeDirection::Sell => (non_reference, reference, sizing.non_reference_human),
        };
        let from_decimals = from.decimals.unwrap_or(18);
        let to_decimals = to.decimals.unwrap_or(18);

        let amount_in = to_raw(human_in, from_decimals);
        let request = QuoteRequest {
            chain_id: pool.chain_id,
            from_token: from.address.clone(),
            to_token: to.address.clone(),
            amount_in: amount_in.clone(),
            slippage: self.settings.quote_slippage.clone(),
        };
        let quote = match self.aggregator.get_quote(&request).await {
            Ok(quote) => quote,
            Err(e) => {
                log::warn!(
                    "quote failed for pool {} on chain {}: {e}",
                    pool.pool_address,
                    pool.chain_id
                );
                return None;
            }
        };

        let human_out = from_raw(&quote.amount_out, to_decimals)?;
        // Both sides valued in reference units via the trigger's implied
        // price, so out/in - 1 is a like-for-like spread.
        let (in_ref, out_ref) = match direction {
            TradeDirection::Buy => (human_in, human_out * sizing.implied_price),
            TradeDirection::Sell => (human_in * sizing.implied_price, human_out),
        };
        if in_ref.is_zero() {
            return None;
        }
        let spread_percent = out_ref / in_ref - Decimal::ONE;

        Some(ArbQuote {
            pool_address: pool.pool_address.clone(),
            chain_id: pool.chain_id,
            from_token: from.address.clone(),
            to_token: to.address.clone(),
            amount_in,
            amount_out: quote.amount_out,
            decimals: from_decimals,
            spread_percent,
            spread_usd: spread_percent * size_usd,
            profitable: spread_percent > self.settings.spread_threshold,
        })
    }
}

/// Sizing derived from the triggering event: human magnitudes of both sides
/// and the implied reference-per-token price.
struct TriggerSizing {
    reference_symbol: String,
    reference_human: Decimal,
    non_reference_human: Decimal,
    implied_price: Decimal,
}

impl TriggerSizing {
    fn from_event(event: &EnrichedSwapEvent) -> Option<Self> {
        let reference_symbol = match &event.classification {
            UsdClassification::Stable { stable_symbol, .. } => stable_symbol.clone(),
            UsdClassification::OraclePriced { priced_symbol, .. } => priced_symbol.clone(),
            UsdClassification::Unclassified => return None,
        };
        let (reference, non_reference) =
            if event.token0.symbol.eq_ignore_ascii_case(&reference_symbol) {
                (&event.token0, &event.token1)
            } else {
                (&event.token1, &event.token0)
            };
        let reference_human = abs_decimal(&reference.amount_formatted)?;
        let non_reference_human = abs_decimal(&non_reference.amount_formatted)?;
        if reference_human.is_zero() || non_reference_human.is_zero() {
            return None;
        }
        Some(Self {
            reference_symbol,
            implied_price: reference_human / non_reference_human,
            reference_human,
            non_reference_human,
        })
    }
}

/// Splits a candidate pool into (reference side, other side), matching the
/// trigger's reference symbol or falling back to the pool's stable side.
fn split_sides<'a>(pool: &'a Pool, reference_symbol: &str) -> Option<(&'a PoolToken, &'a PoolToken)> {
    if pool.token0.symbol.eq_ignore_ascii_case(reference_symbol) {
        return Some((&pool.token0, &pool.token1));
    }
    if pool.token1.symbol.eq_ignore_ascii_case(reference_symbol) {
        return Some((&pool.token1, &pool.token0));
    }
    if pool.token0.stable {
        return Some((&pool.token0, &pool.token1));
    }
    if pool.token1.stable {
        return Some((&pool.token1, &pool.token0));
    }
    log::warn!(
        "pool {} has no side matching reference {reference_symbol}, excluded from scan",
        pool.pool_address
    );
    None
}

fn abs_decimal(formatted: &str) -> Option<Decimal> {
    Decimal::from_str(formatted.trim_start_matches('-')).ok()
}

fn to_raw(human: Decimal, decimals: u32) -> String {
    let scaled = human * Decimal::from(10u64).powi(decimals as i64);
    scaled.trunc().normalize().to_string()
}

fn from_raw(raw: &str, decimals: u32) -> Option<Decimal> {
    let value = Decimal::from_str(raw).ok()?;
    Some(value / Decimal::from(10u64).powi(decimals as i64))
}
