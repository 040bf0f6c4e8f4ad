//! Dual-leg swap execution: preflight checks, concurrent per-leg execution
//! with bounded retry, balance refresh, and settlement reporting.
//!
//! The two legs run on independent chains and the profit depends on
//! near-simultaneous fills, so they are joined, never sequenced. When one
//! leg exhausts its retries the other leg's actual outcome is still recorded
//! on the order; no compensating trade is attempted.

use common::errors::{ExecutionError, PreflightError};
use common::traits::{
    BalanceRepository, ChainClientRegistry, DexAggregator, Notifier, OrderRepository, PriceOracle,
};
use common::types::{
    Address, BalanceRecord, LegConfig, LegResult, LegSettlement, NetworkKind, Order, OrderOutcome,
    OrderStatus, QuoteRequest, SettlementReport, SwapExecution, SwapRequest,
};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Execution policy.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Attempts per leg operation; retries reissue the call immediately,
    /// without backoff and without cancelling a prior in-flight attempt.
    pub max_retries: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self { max_retries: 5 }
    }
}

struct ExecutedLeg {
    result: LegResult,
    execution: SwapExecution,
}

pub struct SwapOrchestrator {
    orders: Arc<dyn OrderRepository>,
    balances: Arc<dyn BalanceRepository>,
    aggregator: Arc<dyn DexAggregator>,
    oracle: Arc<dyn PriceOracle>,
    notifier: Arc<dyn Notifier>,
    chains: Arc<ChainClientRegistry>,
    settings: OrchestratorSettings,
}

impl SwapOrchestrator {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        balances: Arc<dyn BalanceRepository>,
        aggregator: Arc<dyn DexAggregator>,
        oracle: Arc<dyn PriceOracle>,
        notifier: Arc<dyn Notifier>,
        chains: Arc<ChainClientRegistry>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            orders,
            balances,
            aggregator,
            oracle,
            notifier,
            chains,
            settings,
        }
    }

    /// Runs a two-leg order to its terminal state and returns it. The order
    /// status is written exactly once, after both legs have concluded.
    pub async fn submit(&self, legs: [LegConfig; 2]) -> anyhow::Result<Order> {
        let mut order = Order::new(legs);
        self.orders.create(&order).await?;
        log::info!("order {} created", order.id);

        if let Err(e) = self.preflight(&order.legs).await {
            log::warn!("order {} failed preflight: {e}", order.id);
            order.status = OrderStatus::Failed;
            order.outcome = Some(OrderOutcome {
                legs: [None, None],
                error: Some(e.to_string()),
            });
            self.orders.save(&order).await?;
            self.notify_best_effort(&format!("order {} rejected: {e}", order.id))
                .await;
            return Ok(order);
        }

        let (leg0, leg1) = tokio::join!(
            self.run_leg(0, &order.legs[0]),
            self.run_leg(1, &order.legs[1]),
        );

        match (leg0, leg1) {
            (Ok(leg0), Ok(leg1)) => {
                let report = self.settle(&order, [&leg0, &leg1]).await;
                let total_gas = report.total_gas_usd;
                let mut results = [leg0.result, leg1.result];
                for (result, settlement) in results.iter_mut().zip(&report.legs) {
                    result.gas_usd = settlement.gas_usd;
                }
                order.status = OrderStatus::Completed;
                order.outcome = Some(OrderOutcome {
                    legs: [Some(results[0].clone()), Some(results[1].clone())],
                    error: None,
                });
                self.orders.save(&order).await?;
                self.notify_best_effort(&settlement_message(&report)).await;
                log::info!(
                    "order {} completed, total gas {:?} USD",
                    order.id,
                    total_gas
                );
            }
            (leg0, leg1) => {
                let error = [&leg0, &leg1]
                    .iter()
                    .find_map(|r| r.as_ref().err().map(|e| e.to_string()))
                    .unwrap_or_else(|| "unknown execution failure".to_string());
                order.status = OrderStatus::Failed;
                order.outcome = Some(OrderOutcome {
                    legs: [
                        leg0.ok().map(|l| l.result),
                        leg1.ok().map(|l| l.result),
                    ],
                    error: Some(error.clone()),
                });
                self.orders.save(&order).await?;
                self.notify_best_effort(&format!("order {} failed: {error}", order.id))
                    .await;
                log::error!("order {} failed: {error}", order.id);
            }
        }
        Ok(order)
    }

    /// Verifies balances (and allowances for non-Solana legs) before any
    /// chain interaction. Any violation fails the order with zero calls to
    /// the swap-execution collaborator.
    pub async fn preflight(&self, legs: &[LegConfig; 2]) -> anyhow::Result<()> {
        for leg in legs {
            let chain_id = leg.network.chain_id();
            let record = self
                .balances
                .find(&leg.from_token, chain_id)
                .await?
                .ok_or_else(|| PreflightError::MissingBalanceRecord {
                    token: leg.from_token.to_string(),
                    chain_id: chain_id.0,
                })?;

            let need = parse_amount(&leg.amount)?;
            let have = parse_amount(&record.balance)?;
            if have < need {
                return Err(PreflightError::InsufficientBalance {
                    token: leg.from_token.to_string(),
                    have: record.balance.clone(),
                    need: leg.amount.clone(),
                }
                .into());
            }

            if !leg.network.is_solana() {
                let allowance_raw = record.allowance.as_deref().unwrap_or("0");
                let allowance = parse_amount(allowance_raw)?;
                if allowance < need {
                    return Err(PreflightError::InsufficientAllowance {
                        token: leg.from_token.to_string(),
                        have: allowance_raw.to_string(),
                        need: leg.amount.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Resolves a route and executes one leg's swap, each under the same
    /// bounded retry.
    async fn run_leg(&self, leg_index: usize, leg: &LegConfig) -> Result<ExecutedLeg, ExecutionError> {
        let started = Instant::now();

        let quote_request = QuoteRequest {
            chain_id: leg.network.chain_id(),
            from_token: leg.from_token.clone(),
            to_token: leg.to_token.clone(),
            amount_in: leg.amount.clone(),
            slippage: leg.slippage.clone(),
        };
        let (quote, _) = self
            .with_retry(leg_index, "route", || {
                self.aggregator.get_quote(&quote_request)
            })
            .await?;

        let swap_request = SwapRequest {
            network: leg.network,
            wallet: leg.wallet.clone(),
            from_token: leg.from_token.clone(),
            to_token: leg.to_token.clone(),
            amount: leg.amount.clone(),
            slippage: leg.slippage.clone(),
            route: quote.route,
        };
        let (execution, attempts) = self
            .with_retry(leg_index, "swap", || {
                self.aggregator.execute_swap(&swap_request)
            })
            .await?;

        let gas_native = execution
            .receipt
            .as_ref()
            .and_then(|r| r.get("gas_cost"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        let result = LegResult {
            tx_id: execution.tx_id.clone(),
            explorer_url: explorer_link(leg.network, &execution.tx_id),
            attempts,
            elapsed_ms: started.elapsed().as_millis() as u64,
            gas_native,
            gas_usd: None,
        };
        Ok(ExecutedLeg { result, execution })
    }

    async fn with_retry<T, F, Fut>(
        &self,
        leg_index: usize,
        operation: &str,
        mut call: F,
    ) -> Result<(T, u32), ExecutionError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<T>>,
    {
        let mut last_error = String::new();
        for attempt in 1..=self.settings.max_retries {
            match call().await {
                Ok(value) => return Ok((value, attempt)),
                Err(e) => {
                    last_error = e.to_string();
                    log::warn!(
                        "leg {leg_index} {operation} attempt {attempt}/{} failed: {last_error}",
                        self.settings.max_retries
                    );
                }
            }
        }
        Err(ExecutionError::RetriesExhausted {
            leg_index,
            attempts: self.settings.max_retries,
            last_error,
        })
    }

    /// Post-success bookkeeping: refresh both legs' balances from their
    /// chains, price gas in USD, and assemble the settlement report. All of
    /// it is best-effort; the swaps are already on chain.
    async fn settle(&self, order: &Order, executed: [&ExecutedLeg; 2]) -> SettlementReport {
        let mut legs = Vec::with_capacity(2);
        for (leg_index, (leg, executed)) in order.legs.iter().zip(executed).enumerate() {
            let from_delta = self.refresh_balance(leg, &leg.from_token).await;
            let to_delta = self.refresh_balance(leg, &leg.to_token).await;
            let gas_usd = self.gas_in_usd(leg.network, &executed.result.gas_native).await;
            legs.push(LegSettlement {
                leg_index,
                tx_id: executed.execution.tx_id.clone(),
                explorer_url: executed.result.explorer_url.clone(),
                from_token_delta: from_delta,
                to_token_delta: to_delta,
                elapsed_ms: executed.result.elapsed_ms,
                gas_usd,
            });
        }
        let priced: Vec<Decimal> = legs.iter().filter_map(|l| l.gas_usd).collect();
        SettlementReport {
            order_id: order.id,
            total_gas_usd: if priced.is_empty() {
                None
            } else {
                Some(priced.iter().sum())
            },
            legs,
        }
    }

    /// Reads the live on-chain balance, persists it, and returns the delta
    /// against the stored record. `None` when the chain read fails.
    async fn refresh_balance(&self, leg: &LegConfig, token: &Address) -> Option<String> {
        let chain_id = leg.network.chain_id();
        let client = match self.chains.get(chain_id) {
            Ok(client) => client,
            Err(e) => {
                log::warn!("no chain client for {chain_id}, balance not refreshed: {e}");
                return None;
            }
        };
        let fresh = match client.token_balance(token, &leg.wallet).await {
            Ok(balance) => balance,
            Err(e) => {
                log::warn!("balance refresh failed for {token} on {chain_id}: {e}");
                return None;
            }
        };

        let previous = self.balances.find(token, chain_id).await.ok().flatten();
        let delta = match (&previous, BigInt::from_str(&fresh)) {
            (Some(prev), Ok(new)) => BigInt::from_str(&prev.balance)
                .ok()
                .map(|old| (new - old).to_string()),
            (None, Ok(new)) => Some(new.to_string()),
            (_, Err(_)) => None,
        };

        let record = BalanceRecord {
            address: token.clone(),
            chain_id,
            balance: fresh,
            allowance: previous.as_ref().and_then(|p| p.allowance.clone()),
            decimals: previous.as_ref().map(|p| p.decimals).unwrap_or(18),
        };
        if let Err(e) = self.balances.upsert(record).await {
            log::warn!("failed to persist refreshed balance for {token}: {e}");
        }
        delta
    }

    async fn gas_in_usd(&self, network: NetworkKind, gas_native: &Option<String>) -> Option<Decimal> {
        let gas = Decimal::from_str(gas_native.as_deref()?).ok()?;
        match self.oracle.get_price(native_symbol(network)).await {
            Ok(price) => Some(gas * price),
            Err(e) => {
                log::warn!("gas price conversion failed: {e}");
                None
            }
        }
    }

    async fn notify_best_effort(&self, message: &str) {
        if let Err(e) = self.notifier.notify(message).await {
            log::warn!("notification delivery failed: {e}");
        }
    }
}

fn parse_amount(raw: &str) -> anyhow::Result<BigInt> {
    BigInt::from_str(raw).map_err(|e| anyhow::anyhow!("unparseable amount {raw}: {e}"))
}

fn native_symbol(network: NetworkKind) -> &'static str {
    match network {
        NetworkKind::Evm { .. } => "ETH",
        NetworkKind::Solana => "SOL",
    }
}

fn explorer_link(network: NetworkKind, tx_id: &str) -> Option<String> {
    match network {
        NetworkKind::Solana => Some(format!("https://solscan.io/tx/{tx_id}")),
        NetworkKind::Evm { .. } => None,
    }
}

fn settlement_message(report: &SettlementReport) -> String {
    let mut message = format!("order {} settled", report.order_id);
    for leg in &report.legs {
        message.push_str(&format!(
            "\nleg {}: tx {}{} in {} ms, from delta {}, to delta {}, gas {} USD",
            leg.leg_index,
            leg.tx_id,
            leg.explorer_url
                .as_deref()
                .map(|u| format!(" ({u})"))
                .unwrap_or_default(),
            leg.elapsed_ms,
            leg.from_token_delta.as_deref().unwrap_or("?"),
            leg.to_token_delta.as_deref().unwrap_or("?"),
            leg.gas_usd
                .map(|g| g.to_string())
                .unwrap_or_else(|| "?".to_string()),
        ));
    }
    if let Some(total) = report.total_gas_usd {
        message.push_str(&format!("\ntotal gas: {total} USD"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::memory::{InMemoryBalances, InMemoryOrders, RecordingNotifier};
    use common::traits::{ChainClient, DexAggregator, PriceOracle};
    use common::types::{ChainId, Quote};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Aggregator whose swap calls fail a scripted number of times per
    /// chain before succeeding.
    #[derive(Default)]
    struct ScriptedAggregator {
        fail_first: Mutex<HashMap<ChainId, u32>>,
        swap_calls: Mutex<HashMap<ChainId, u32>>,
        total_swap_calls: AtomicU32,
    }

    impl ScriptedAggregator {
        fn failing_first(fails: &[(ChainId, u32)]) -> Self {
            Self {
                fail_first: Mutex::new(fails.iter().copied().collect()),
                ..Default::default()
            }
        }

        fn swap_calls(&self, chain_id: ChainId) -> u32 {
            *self.swap_calls.lock().unwrap().get(&chain_id).unwrap_or(&0)
        }

        fn total_calls(&self) -> u32 {
            self.total_swap_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DexAggregator for ScriptedAggregator {
        async fn get_quote(&self, _request: &QuoteRequest) -> anyhow::Result<Quote> {
            Ok(Quote {
                amount_out: "0".to_string(),
                route: Some(serde_json::json!({"path": "scripted"})),
            })
        }

        async fn execute_swap(&self, request: &SwapRequest) -> anyhow::Result<SwapExecution> {
            let chain_id = request.network.chain_id();
            self.total_swap_calls.fetch_add(1, Ordering::SeqCst);
            let call = {
                let mut calls = self.swap_calls.lock().unwrap();
                let entry = calls.entry(chain_id).or_insert(0);
                *entry += 1;
                *entry
            };
            let fail_limit = *self.fail_first.lock().unwrap().get(&chain_id).unwrap_or(&0);
            if call <= fail_limit {
                anyhow::bail!("swap reverted on chain {chain_id} (call {call})");
            }
            Ok(SwapExecution {
                tx_id: format!("0xtx{chain_id}"),
                status: "success".to_string(),
                receipt: Some(serde_json::json!({"gas_cost": "0.001"})),
            })
        }
    }

    struct FixedClient {
        balance: String,
    }

    #[async_trait]
    impl ChainClient for FixedClient {
        async fn native_balance(&self, _wallet: &Address) -> anyhow::Result<String> {
            Ok("0".to_string())
        }

        async fn token_balance(&self, _token: &Address, _wallet: &Address) -> anyhow::Result<String> {
            Ok(self.balance.clone())
        }

        async fn token_decimals(&self, _token: &Address) -> anyhow::Result<u32> {
            Ok(18)
        }
    }

    struct FixedOracle;

    #[async_trait]
    impl PriceOracle for FixedOracle {
        async fn get_price(&self, _symbol: &str) -> anyhow::Result<Decimal> {
            Ok(dec!(2000))
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl common::traits::Notifier for FailingNotifier {
        async fn notify(&self, _message: &str) -> anyhow::Result<()> {
            anyhow::bail!("telegram is down")
        }
    }

    fn evm_leg(chain: u64, from: &str, amount: &str) -> LegConfig {
        LegConfig {
            network: NetworkKind::Evm {
                chain_id: ChainId(chain),
            },
            wallet: Address::from("0xwallet"),
            from_token: Address::from(from),
            to_token: Address::from("0xout"),
            amount: amount.to_string(),
            slippage: "0.5".to_string(),
        }
    }

    fn solana_leg(from: &str, amount: &str) -> LegConfig {
        LegConfig {
            network: NetworkKind::Solana,
            wallet: Address::from("solwallet"),
            from_token: Address::from(from),
            to_token: Address::from("solout"),
            amount: amount.to_string(),
            slippage: "0.5".to_string(),
        }
    }

    async fn seed_balance(
        balances: &InMemoryBalances,
        token: &str,
        chain: ChainId,
        balance: &str,
        allowance: Option<&str>,
    ) {
        balances
            .upsert(BalanceRecord {
                address: Address::from(token),
                chain_id: chain,
                balance: balance.to_string(),
                allowance: allowance.map(str::to_string),
                decimals: 6,
            })
            .await
            .unwrap();
    }

    struct Harness {
        orchestrator: SwapOrchestrator,
        orders: Arc<InMemoryOrders>,
        balances: Arc<InMemoryBalances>,
        aggregator: Arc<ScriptedAggregator>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(aggregator: ScriptedAggregator) -> Harness {
        let orders = Arc::new(InMemoryOrders::new());
        let balances = Arc::new(InMemoryBalances::new());
        let aggregator = Arc::new(aggregator);
        let notifier = Arc::new(RecordingNotifier::new());
        let chains = Arc::new(ChainClientRegistry::new());
        chains.register(
            ChainId(1),
            Arc::new(FixedClient {
                balance: "777".to_string(),
            }),
        );
        chains.register(
            ChainId(8453),
            Arc::new(FixedClient {
                balance: "888".to_string(),
            }),
        );
        chains.register(
            ChainId(101),
            Arc::new(FixedClient {
                balance: "999".to_string(),
            }),
        );

        let orchestrator = SwapOrchestrator::new(
            orders.clone(),
            balances.clone(),
            aggregator.clone(),
            Arc::new(FixedOracle),
            notifier.clone(),
            chains,
            OrchestratorSettings::default(),
        );
        Harness {
            orchestrator,
            orders,
            balances,
            aggregator,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_insufficient_balance_fails_before_any_chain_call() {
        let h = harness(ScriptedAggregator::default());
        seed_balance(&h.balances, "0xusdc", ChainId(1), "50", Some("1000")).await;
        seed_balance(&h.balances, "0xusdt", ChainId(8453), "1000", Some("1000")).await;

        let order = h
            .orchestrator
            .submit([
                evm_leg(1, "0xusdc", "100"),
                evm_leg(8453, "0xusdt", "100"),
            ])
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Failed);
        let outcome = order.outcome.unwrap();
        assert!(outcome.error.unwrap().contains("insufficient balance"));
        assert_eq!(outcome.legs, [None, None]);
        assert_eq!(h.aggregator.total_calls(), 0);
        // The terminal state is what got persisted.
        assert_eq!(h.orders.get(&order.id).unwrap().status, OrderStatus::Failed);
    }

    #[tokio::test]
    async fn test_preflight_typed_violations() {
        let h = harness(ScriptedAggregator::default());
        seed_balance(&h.balances, "0xusdc", ChainId(1), "500", Some("10")).await;
        seed_balance(&h.balances, "solmint", ChainId(101), "500", None).await;

        // EVM leg with a too-small allowance.
        let err = h
            .orchestrator
            .preflight(&[evm_leg(1, "0xusdc", "100"), solana_leg("solmint", "100")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreflightError>(),
            Some(PreflightError::InsufficientAllowance { .. })
        ));

        // Missing record entirely.
        let err = h
            .orchestrator
            .preflight(&[evm_leg(1, "0xunknown", "100"), solana_leg("solmint", "100")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreflightError>(),
            Some(PreflightError::MissingBalanceRecord { .. })
        ));
    }

    #[tokio::test]
    async fn test_solana_leg_needs_no_allowance() {
        let h = harness(ScriptedAggregator::default());
        seed_balance(&h.balances, "solmint", ChainId(101), "500", None).await;
        seed_balance(&h.balances, "0xusdc", ChainId(1), "500", Some("500")).await;

        h.orchestrator
            .preflight(&[solana_leg("solmint", "100"), evm_leg(1, "0xusdc", "100")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_leg_succeeds_on_final_attempt() {
        let h = harness(ScriptedAggregator::failing_first(&[(ChainId(1), 4)]));
        seed_balance(&h.balances, "0xusdc", ChainId(1), "500", Some("500")).await;
        seed_balance(&h.balances, "0xusdt", ChainId(8453), "500", Some("500")).await;

        let order = h
            .orchestrator
            .submit([
                evm_leg(1, "0xusdc", "100"),
                evm_leg(8453, "0xusdt", "100"),
            ])
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        let outcome = order.outcome.unwrap();
        let leg0 = outcome.legs[0].as_ref().unwrap();
        assert_eq!(leg0.attempts, 5);
        assert_eq!(leg0.tx_id, "0xtx1");
        // Gas priced at 0.001 ETH * 2000 USD.
        assert_eq!(leg0.gas_usd, Some(dec!(2)));
        assert_eq!(outcome.legs[1].as_ref().unwrap().attempts, 1);
        assert_eq!(h.notifier.messages().len(), 1);
        assert!(h.notifier.messages()[0].contains("settled"));
    }

    #[tokio::test]
    async fn test_exhausted_leg_fails_order_but_keeps_other_result() {
        let h = harness(ScriptedAggregator::failing_first(&[(ChainId(8453), 10)]));
        seed_balance(&h.balances, "0xusdc", ChainId(1), "500", Some("500")).await;
        seed_balance(&h.balances, "0xusdt", ChainId(8453), "500", Some("500")).await;

        let order = h
            .orchestrator
            .submit([
                evm_leg(1, "0xusdc", "100"),
                evm_leg(8453, "0xusdt", "100"),
            ])
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Failed);
        // Exactly the retry bound was spent on the failing leg.
        assert_eq!(h.aggregator.swap_calls(ChainId(8453)), 5);
        let outcome = order.outcome.unwrap();
        assert!(outcome.error.unwrap().contains("after 5 attempts"));
        // The successful leg's on-chain result is recorded, unremediated.
        assert_eq!(outcome.legs[0].as_ref().unwrap().tx_id, "0xtx1");
        assert!(outcome.legs[1].is_none());
    }

    #[tokio::test]
    async fn test_balances_refreshed_after_success() {
        let h = harness(ScriptedAggregator::default());
        seed_balance(&h.balances, "0xusdc", ChainId(1), "500", Some("500")).await;
        seed_balance(&h.balances, "solmint", ChainId(101), "500", None).await;

        let order = h
            .orchestrator
            .submit([
                evm_leg(1, "0xusdc", "100"),
                solana_leg("solmint", "100"),
            ])
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        // Chain 1 client reports 777 now; the record was overwritten and
        // the allowance preserved.
        let refreshed = h
            .balances
            .find(&Address::from("0xusdc"), ChainId(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.balance, "777");
        assert_eq!(refreshed.allowance, Some("500".to_string()));

        // The Solana leg got its explorer link.
        let outcome = order.outcome.unwrap();
        assert_eq!(
            outcome.legs[1].as_ref().unwrap().explorer_url,
            Some("https://solscan.io/tx/0xtx101".to_string())
        );
    }

    #[tokio::test]
    async fn test_notifier_failure_never_fails_the_order() {
        let orders = Arc::new(InMemoryOrders::new());
        let balances = Arc::new(InMemoryBalances::new());
        let aggregator = Arc::new(ScriptedAggregator::default());
        let chains = Arc::new(ChainClientRegistry::new());
        chains.register(
            ChainId(1),
            Arc::new(FixedClient {
                balance: "1".to_string(),
            }),
        );
        let orchestrator = SwapOrchestrator::new(
            orders,
            balances.clone(),
            aggregator,
            Arc::new(FixedOracle),
            Arc::new(FailingNotifier),
            chains,
            OrchestratorSettings::default(),
        );
        seed_balance(&balances, "0xusdc", ChainId(1), "500", Some("500")).await;
        seed_balance(&balances, "0xusdt", ChainId(1), "500", Some("500")).await;

        let order = orchestrator
            .submit([evm_leg(1, "0xusdc", "100"), evm_leg(1, "0xusdt", "100")])
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }
}
