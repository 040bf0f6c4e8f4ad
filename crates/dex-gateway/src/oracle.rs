//! Spot-price oracle backed by a Bybit-style tickers endpoint. Prices come
//! back as decimal strings and stay decimal.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use common::traits::PriceOracle;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.bybit.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TickersResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: TickersResult,
}

#[derive(Debug, Deserialize)]
struct TickersResult {
    list: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    #[serde(rename = "lastPrice")]
    last_price: String,
}

pub struct HttpPriceOracle {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPriceOracle {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("failed to build oracle http client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn with_default_endpoint() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        // The quote currency itself.
        if symbol.eq_ignore_ascii_case("USDC") || symbol.eq_ignore_ascii_case("USDT") {
            return Ok(Decimal::ONE);
        }

        let response = self
            .client
            .get(format!("{}/v5/market/tickers", self.base_url))
            .query(&[
                ("category", "spot"),
                ("symbol", &format!("{}USDT", symbol.to_uppercase())),
            ])
            .send()
            .await
            .with_context(|| format!("price request failed for {symbol}"))?;
        let tickers: TickersResponse = response
            .json()
            .await
            .with_context(|| format!("malformed ticker response for {symbol}"))?;

        if tickers.ret_code != 0 {
            bail!("ticker api error for {symbol}: {}", tickers.ret_msg);
        }
        let Some(ticker) = tickers.result.list.first() else {
            bail!("no ticker returned for {symbol}");
        };
        Decimal::from_str(&ticker.last_price)
            .with_context(|| format!("unparseable price {} for {symbol}", ticker.last_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_stable_quote_currency_short_circuits() {
        let oracle = HttpPriceOracle::new("http://127.0.0.1:1").unwrap();
        // No HTTP round trip happens for the quote currency itself.
        assert_eq!(oracle.get_price("USDC").await.unwrap(), Decimal::ONE);
        assert_eq!(oracle.get_price("usdt").await.unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_tickers_response_shape() {
        let json = r#"{
            "retCode": 0,
            "retMsg": "OK",
            "result": { "list": [{ "lastPrice": "2043.17" }] }
        }"#;
        let parsed: TickersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.ret_code, 0);
        assert_eq!(
            Decimal::from_str(&parsed.result.list[0].last_price).unwrap(),
            dec!(2043.17)
        );
    }

    #[test]
    fn test_error_response_shape() {
        let json = r#"{"retCode": 10001, "retMsg": "params error", "result": {"list": []}}"#;
        let parsed: TickersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.ret_code, 10001);
        assert!(parsed.result.list.is_empty());
    }
}
