use chrono::{DateTime, Utc};
use num_bigint::{BigInt, Sign};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Numeric identifier of a blockchain. Solana is carried under the
/// conventional id 101 so balance records share one keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

pub const SOLANA_CHAIN_ID: ChainId = ChainId(101);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

/// An on-chain account, token, or pool address, normalized to lowercase so
/// lookups keyed by address are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Address(raw.as_ref().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::new(s)
    }
}

/// Supported DEX protocol variants. One tag per log layout the decoder
/// understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DexProtocol {
    UniswapV2,
    UniswapV3,
    UniswapV4,
    PancakeV3,
}

impl DexProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            DexProtocol::UniswapV2 => "uniswap_v2",
            DexProtocol::UniswapV3 => "uniswap_v3",
            DexProtocol::UniswapV4 => "uniswap_v4",
            DexProtocol::PancakeV3 => "pancake_v3",
        }
    }
}

impl fmt::Display for DexProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw EVM log as delivered by the chain connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLog {
    /// Emitting contract address.
    pub address: Address,
    /// Indexed topics, `0x`-prefixed hex, topic 0 first.
    pub topics: Vec<String>,
    /// Unindexed data payload, `0x`-prefixed hex.
    pub data: String,
}

/// Block metadata from a new-head notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: String,
    pub timestamp: i64,
}

/// A swap event decoded from a single log. Amounts are signed net amounts per
/// pool token, serialized as decimal strings; no floating point touches them
/// at any stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSwapEvent {
    pub chain_id: ChainId,
    pub block_number: u64,
    pub block_hash: String,
    pub block_timestamp: i64,
    pub observed_at: DateTime<Utc>,
    pub pool_address: Address,
    pub sender_address: Address,
    /// Signed net amount of token0, positive when the pool received it.
    pub token0_amount: String,
    /// Signed net amount of token1, positive when the pool received it.
    pub token1_amount: String,
    pub protocol: DexProtocol,
    /// Auxiliary price word (sqrtPriceX96) for protocols that emit one,
    /// captured verbatim as hex.
    pub sqrt_price: Option<String>,
}

impl DecodedSwapEvent {
    pub fn token0_amount_int(&self) -> Option<BigInt> {
        BigInt::from_str(&self.token0_amount).ok()
    }

    pub fn token1_amount_int(&self) -> Option<BigInt> {
        BigInt::from_str(&self.token1_amount).ok()
    }

    /// Magnitude of the side the pool received, if any.
    pub fn amount_in(&self) -> Option<BigInt> {
        [self.token0_amount_int()?, self.token1_amount_int()?]
            .into_iter()
            .find(|a| a.sign() == Sign::Plus)
    }

    /// Magnitude of the side the pool paid out, if any.
    pub fn amount_out(&self) -> Option<BigInt> {
        [self.token0_amount_int()?, self.token1_amount_int()?]
            .into_iter()
            .find(|a| a.sign() == Sign::Minus)
            .map(|a| -a)
    }
}

/// Trade direction of the non-reference token in an enriched swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "BUY"),
            TradeDirection::Sell => write!(f, "SELL"),
        }
    }
}

/// How the USD notional of a swap was derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsdClassification {
    /// One side of the pool is a stablecoin; its absolute amount is the size.
    Stable {
        stable_symbol: String,
        size_usd: Decimal,
    },
    /// One side has a known spot price (native/major assets only).
    OraclePriced {
        priced_symbol: String,
        price: Decimal,
        size_usd: Decimal,
    },
    /// Neither side is priceable; the event is logged but never routed to a
    /// strategy.
    Unclassified,
}

impl UsdClassification {
    pub fn size_usd(&self) -> Option<Decimal> {
        match self {
            UsdClassification::Stable { size_usd, .. } => Some(*size_usd),
            UsdClassification::OraclePriced { size_usd, .. } => Some(*size_usd),
            UsdClassification::Unclassified => None,
        }
    }
}

/// One token side of a catalog pool. `decimals` is the per-chain mapping and
/// may be absent; consumers fall back to 18.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolToken {
    pub symbol: String,
    pub address: Address,
    pub decimals: Option<u32>,
    pub stable: bool,
}

/// Reference to the strategy a pool belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRef {
    pub id: String,
    /// Strategy type, also the routing-queue discriminator.
    pub kind: String,
}

/// A catalog pool resolved by address and chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub pool_address: Address,
    pub chain_id: ChainId,
    pub token0: PoolToken,
    pub token1: PoolToken,
    pub dex_name: String,
    pub fee: Option<u32>,
    pub strategy: Option<StrategyRef>,
}

/// Token side of an enriched swap: catalog data plus raw and display amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedToken {
    pub symbol: String,
    pub address: Address,
    pub decimals: u32,
    pub stable: bool,
    /// Signed raw amount, decimal string.
    pub amount: String,
    /// Display-only formatted amount; never used for arithmetic.
    pub amount_formatted: String,
}

/// A decoded swap resolved against the pool catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSwapEvent {
    pub swap: DecodedSwapEvent,
    pub pool_id: String,
    pub dex_name: String,
    pub fee: Option<u32>,
    pub token0: EnrichedToken,
    pub token1: EnrichedToken,
    pub classification: UsdClassification,
    pub direction: Option<TradeDirection>,
    pub strategy: Option<StrategyRef>,
}

/// A quote request against the DEX aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub chain_id: ChainId,
    pub from_token: Address,
    pub to_token: Address,
    /// Raw input amount in `from_token` units, decimal string.
    pub amount_in: String,
    pub slippage: String,
}

/// Aggregator quote response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Raw output amount in `to_token` units, decimal string.
    pub amount_out: String,
    pub route: Option<serde_json::Value>,
}

/// One scan candidate: a quoted pool with its computed spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbQuote {
    pub pool_address: Address,
    pub chain_id: ChainId,
    pub from_token: Address,
    pub to_token: Address,
    pub amount_in: String,
    pub amount_out: String,
    pub decimals: u32,
    pub spread_percent: Decimal,
    pub spread_usd: Decimal,
    pub profitable: bool,
}

/// Which network family a leg executes on. Dispatched by match, never by
/// probing optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "network", rename_all = "snake_case")]
pub enum NetworkKind {
    Evm { chain_id: ChainId },
    Solana,
}

impl NetworkKind {
    pub fn is_solana(&self) -> bool {
        matches!(self, NetworkKind::Solana)
    }

    pub fn chain_id(&self) -> ChainId {
        match self {
            NetworkKind::Evm { chain_id } => *chain_id,
            NetworkKind::Solana => SOLANA_CHAIN_ID,
        }
    }
}

/// Input configuration of a single order leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegConfig {
    pub network: NetworkKind,
    pub wallet: Address,
    pub from_token: Address,
    pub to_token: Address,
    /// Raw amount of `from_token` to swap, decimal string.
    pub amount: String,
    pub slippage: String,
}

/// Parameters handed to the aggregator's swap execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub network: NetworkKind,
    pub wallet: Address,
    pub from_token: Address,
    pub to_token: Address,
    pub amount: String,
    pub slippage: String,
    /// Route resolved during the quote phase, passed through opaquely.
    pub route: Option<serde_json::Value>,
}

/// Aggregator swap execution response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapExecution {
    pub tx_id: String,
    pub status: String,
    pub receipt: Option<serde_json::Value>,
}

/// Terminal-once order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one executed leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegResult {
    pub tx_id: String,
    pub explorer_url: Option<String>,
    pub attempts: u32,
    pub elapsed_ms: u64,
    /// Gas cost in native units, decimal string.
    pub gas_native: Option<String>,
    pub gas_usd: Option<Decimal>,
}

/// Per-order result record. On partial failure the surviving leg's result is
/// still kept here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub legs: [Option<LegResult>; 2],
    pub error: Option<String>,
}

/// A two-leg arbitrage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub legs: [LegConfig; 2],
    pub status: OrderStatus,
    pub outcome: Option<OrderOutcome>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(legs: [LegConfig; 2]) -> Self {
        Order {
            id: Uuid::new_v4(),
            legs,
            status: OrderStatus::Pending,
            outcome: None,
            created_at: Utc::now(),
        }
    }
}

/// Settlement of one leg as reported to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegSettlement {
    pub leg_index: usize,
    pub tx_id: String,
    pub explorer_url: Option<String>,
    pub from_token_delta: Option<String>,
    pub to_token_delta: Option<String>,
    pub elapsed_ms: u64,
    pub gas_usd: Option<Decimal>,
}

/// Final report for a fully settled order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub order_id: Uuid,
    pub legs: Vec<LegSettlement>,
    pub total_gas_usd: Option<Decimal>,
}

/// Stored balance/allowance record for a token on a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub address: Address,
    pub chain_id: ChainId,
    /// Raw balance, decimal string.
    pub balance: String,
    /// Current spender allowance; absent for networks without allowances.
    pub allowance: Option<String>,
    pub decimals: u32,
}

/// Status row for one configured chain watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub chain_id: ChainId,
    pub rpc_url: String,
    pub active: bool,
}
