//! Per-protocol log layouts. Everything the decoder needs to know about a
//! DEX variant lives in this table; adding a variant is a new row, not a new
//! branch.

use common::types::DexProtocol;

/// How the amount words of a swap log are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountLayout {
    /// Four unsigned words: amount0In, amount1In, amount0Out, amount1Out.
    /// The nonzero in/out entry per token is folded into one signed net
    /// amount (in minus out).
    UnsignedInOut,
    /// Two signed words: amount0, amount1, two's complement.
    SignedPair,
}

/// Where a log's pool identifier comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSource {
    /// The emitting contract address.
    LogAddress,
    /// An indexed topic. Kept as the full 32-byte word: for singleton-style
    /// protocols the pool id is not an address.
    Topic(usize),
}

/// Static description of one swap-event variant.
#[derive(Debug, Clone, Copy)]
pub struct EventSchema {
    pub protocol: DexProtocol,
    /// topic0 of the event, lowercase hex with `0x` prefix.
    pub topic0: &'static str,
    pub layout: AmountLayout,
    /// Topic index carrying the sender address.
    pub sender_topic: usize,
    pub pool_source: PoolSource,
    /// Word index of the auxiliary price field (sqrtPriceX96), if emitted.
    pub aux_price_word: Option<usize>,
}

pub const SCHEMAS: &[EventSchema] = &[
    EventSchema {
        protocol: DexProtocol::UniswapV2,
        topic0: "0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822",
        layout: AmountLayout::UnsignedInOut,
        sender_topic: 1,
        pool_source: PoolSource::LogAddress,
        aux_price_word: None,
    },
    EventSchema {
        protocol: DexProtocol::UniswapV3,
        topic0: "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67",
        layout: AmountLayout::SignedPair,
        sender_topic: 1,
        pool_source: PoolSource::LogAddress,
        aux_price_word: Some(2),
    },
    EventSchema {
        protocol: DexProtocol::UniswapV4,
        topic0: "0x40e9cecb9f5f1f1c5b9c97dec2917b7ee92e57ba5563708daca94dd84ad7112f",
        layout: AmountLayout::SignedPair,
        sender_topic: 2,
        pool_source: PoolSource::Topic(1),
        aux_price_word: Some(2),
    },
    EventSchema {
        protocol: DexProtocol::PancakeV3,
        topic0: "0x19b47279256b2a23a1665c810c8d55a1758940ee09377d4f8d26497a3577dc83",
        layout: AmountLayout::SignedPair,
        sender_topic: 1,
        pool_source: PoolSource::LogAddress,
        aux_price_word: Some(2),
    },
];

/// Looks up the schema for a log's first topic. `None` means the log is not
/// a swap event we understand and gets skipped.
pub fn schema_for_topic(topic0: &str) -> Option<&'static EventSchema> {
    let needle = topic0.to_lowercase();
    SCHEMAS.iter().find(|s| s.topic0 == needle)
}
