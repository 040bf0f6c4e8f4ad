//! Resolves decoded swaps against the pool catalog: human-readable amounts,
//! USD sizing, and trade direction. Enrichment is deterministic for a fixed
//! catalog and price cache, so redelivered events produce identical output.

use crate::prices::PriceCache;
use anyhow::{anyhow, Result};
use common::traits::PoolCatalog;
use common::types::{
    DecodedSwapEvent, EnrichedSwapEvent, EnrichedToken, PoolToken, TradeDirection,
    UsdClassification,
};
use num_bigint::{BigInt, Sign};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_DECIMALS: u32 = 18;
const DISPLAY_FRACTION_DIGITS: usize = 6;

/// Why an event was dropped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PoolNotFound,
}

/// Soft outcome of enrichment. `Skipped` is normal operation, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichOutcome {
    Enriched(EnrichedSwapEvent),
    Skipped(SkipReason),
}

pub struct EventEnricher {
    catalog: Arc<dyn PoolCatalog>,
    prices: Arc<PriceCache>,
}

impl EventEnricher {
    pub fn new(catalog: Arc<dyn PoolCatalog>, prices: Arc<PriceCache>) -> Self {
        Self { catalog, prices }
    }

    pub async fn enrich(&self, event: &DecodedSwapEvent) -> Result<EnrichOutcome> {
        let Some(pool) = self
            .catalog
            .find_pool_by_address(&event.pool_address, event.chain_id)
            .await?
        else {
            return Ok(EnrichOutcome::Skipped(SkipReason::PoolNotFound));
        };

        let amount0 = event
            .token0_amount_int()
            .ok_or_else(|| anyhow!("unparseable token0 amount: {}", event.token0_amount))?;
        let amount1 = event
            .token1_amount_int()
            .ok_or_else(|| anyhow!("unparseable token1 amount: {}", event.token1_amount))?;

        let token0 = enriched_token(&pool.token0, &amount0, &event.token0_amount);
        let token1 = enriched_token(&pool.token1, &amount1, &event.token1_amount);

        let (classification, direction) = self.classify(&token0, &amount0, &token1, &amount1)?;

        Ok(EnrichOutcome::Enriched(EnrichedSwapEvent {
            swap: event.clone(),
            pool_id: pool.id,
            dex_name: pool.dex_name,
            fee: pool.fee,
            token0,
            token1,
            classification,
            direction,
            strategy: pool.strategy,
        }))
    }

    /// Priority order: stable side, then oracle-priced side, then
    /// unclassified. Direction is BUY of the non-reference token when the
    /// pool paid it out (negative amount).
    fn classify(
        &self,
        token0: &EnrichedToken,
        amount0: &BigInt,
        token1: &EnrichedToken,
        amount1: &BigInt,
    ) -> Result<(UsdClassification, Option<TradeDirection>)> {
        if token0.stable || token1.stable {
            let (stable, other_amount) = if token0.stable {
                (token0, amount1)
            } else {
                (token1, amount0)
            };
            let size_usd = abs_decimal(&stable.amount_formatted)?;
            return Ok((
                UsdClassification::Stable {
                    stable_symbol: stable.symbol.clone(),
                    size_usd,
                },
                Some(direction_of(other_amount)),
            ));
        }

        let priced = [(token0, amount1), (token1, amount0)]
            .into_iter()
            .find_map(|(token, other_amount)| {
                self.prices
                    .get(&token.symbol)
                    .map(|price| (token, price, other_amount))
            });
        if let Some((token, price, other_amount)) = priced {
            let size_usd = abs_decimal(&token.amount_formatted)? * price;
            return Ok((
                UsdClassification::OraclePriced {
                    priced_symbol: token.symbol.clone(),
                    price,
                    size_usd,
                },
                Some(direction_of(other_amount)),
            ));
        }

        Ok((UsdClassification::Unclassified, None))
    }
}

fn enriched_token(token: &PoolToken, amount: &BigInt, raw: &str) -> EnrichedToken {
    let decimals = token.decimals.unwrap_or(DEFAULT_DECIMALS);
    EnrichedToken {
        symbol: token.symbol.clone(),
        address: token.address.clone(),
        decimals,
        stable: token.stable,
        amount: raw.to_string(),
        amount_formatted: format_amount(amount, decimals),
    }
}

fn direction_of(non_reference_amount: &BigInt) -> TradeDirection {
    if non_reference_amount.sign() == Sign::Minus {
        TradeDirection::Buy
    } else {
        TradeDirection::Sell
    }
}

/// Display formatting only: integer division and modulo, fraction truncated
/// to six digits with trailing zeros trimmed. All arithmetic elsewhere stays
/// on the raw integer amounts.
pub fn format_amount(amount: &BigInt, decimals: u32) -> String {
    let negative = amount.sign() == Sign::Minus;
    let abs = if negative { -amount } else { amount.clone() };
    let divisor = BigInt::from(10u32).pow(decimals);
    let integer_part = &abs / &divisor;
    let fractional_part = &abs % &divisor;

    let padded = format!(
        "{:0>width$}",
        fractional_part.to_string(),
        width = decimals as usize
    );
    let truncated: String = padded.chars().take(DISPLAY_FRACTION_DIGITS).collect();
    let trimmed = truncated.trim_end_matches('0');

    let sign = if negative { "-" } else { "" };
    if trimmed.is_empty() {
        format!("{sign}{integer_part}")
    } else {
        format!("{sign}{integer_part}.{trimmed}")
    }
}

fn abs_decimal(formatted: &str) -> Result<Decimal> {
    Decimal::from_str(formatted.trim_start_matches('-'))
        .map_err(|e| anyhow!("unparseable formatted amount {formatted}: {e}"))
}
