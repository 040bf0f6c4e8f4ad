//! HTTP client for the external DEX-aggregator API: route quoting and swap
//! execution. The aggregator owns routing math and transaction broadcast;
//! this client only shapes requests and responses.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use common::traits::DexAggregator;
use common::types::{Quote, QuoteRequest, SwapExecution, SwapRequest};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "amountOut")]
    amount_out: String,
    route: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    #[serde(rename = "txId")]
    tx_id: String,
    status: String,
    receipt: Option<serde_json::Value>,
}

pub struct HttpDexAggregator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDexAggregator {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("failed to build aggregator http client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl DexAggregator for HttpDexAggregator {
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote> {
        let response = self
            .client
            .get(format!("{}/quote", self.base_url))
            .query(&[
                ("chainId", request.chain_id.to_string()),
                ("fromTokenAddress", request.from_token.to_string()),
                ("toTokenAddress", request.to_token.to_string()),
                ("amount", request.amount_in.clone()),
                ("slippage", request.slippage.clone()),
            ])
            .send()
            .await
            .context("quote request failed")?;
        if !response.status().is_success() {
            bail!("aggregator quote returned {}", response.status());
        }
        let quote: QuoteResponse = response.json().await.context("malformed quote response")?;
        Ok(Quote {
            amount_out: quote.amount_out,
            route: quote.route,
        })
    }

    async fn execute_swap(&self, request: &SwapRequest) -> Result<SwapExecution> {
        let response = self
            .client
            .post(format!("{}/swap", self.base_url))
            .json(request)
            .send()
            .await
            .context("swap request failed")?;
        if !response.status().is_success() {
            bail!("aggregator swap returned {}", response.status());
        }
        let swap: SwapResponse = response.json().await.context("malformed swap response")?;
        Ok(SwapExecution {
            tx_id: swap.tx_id,
            status: swap.status,
            receipt: swap.receipt,
        })
    }
}
