//! Cached spot prices for the handful of native/major assets the enricher
//! can value. Refreshed on a fixed period; a failed refresh keeps the last
//! good value.

use common::traits::PriceOracle;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Wrapped forms quote at their underlying's price.
fn normalize_symbol(symbol: &str) -> String {
    match symbol.to_uppercase().as_str() {
        "WETH" => "ETH".to_string(),
        "WBTC" => "BTC".to_string(),
        other => other.to_string(),
    }
}

#[derive(Default)]
pub struct PriceCache {
    prices: DashMap<String, Decimal>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self {
            prices: DashMap::new(),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.prices
            .get(&normalize_symbol(symbol))
            .map(|p| *p.value())
    }

    pub fn set(&self, symbol: &str, price: Decimal) {
        self.prices.insert(normalize_symbol(symbol), price);
    }

    /// Pulls fresh prices for every tracked symbol. Individual failures are
    /// logged and leave the cached value untouched.
    pub async fn refresh(&self, oracle: &dyn PriceOracle, symbols: &[String]) {
        for symbol in symbols {
            match oracle.get_price(symbol).await {
                Ok(price) => {
                    self.set(symbol, price);
                    info!(symbol = %symbol, price = %price, "price updated");
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "price refresh failed");
                }
            }
        }
    }

    /// Spawns the periodic refresh loop. The first refresh happens
    /// immediately so enrichment does not start against an empty cache.
    pub fn spawn_refresh(
        self: Arc<Self>,
        oracle: Arc<dyn PriceOracle>,
        symbols: Vec<String>,
        period: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                self.refresh(oracle.as_ref(), &symbols).await;
            }
        })
    }
}
