//! Pure log decoding: raw topic/data bytes to typed swap events, driven by
//! the schema table in [`crate::schema`].

use crate::schema::{schema_for_topic, AmountLayout, EventSchema, PoolSource};
use chrono::{DateTime, Utc};
use common::errors::DecodeError;
use common::types::{Address, BlockHeader, ChainId, DecodedSwapEvent, RawLog};
use num_bigint::BigInt;
use tracing::{debug, warn};

const WORD_HEX_LEN: usize = 64;

/// Decodes a 32-byte hex word as a signed 256-bit two's-complement integer.
/// Values with the top bit set are `unsigned - 2^256`; everything stays in
/// arbitrary-precision integers.
pub fn decode_int256(word: &str) -> Result<BigInt, DecodeError> {
    let unsigned = decode_uint256(word)?;
    let sign_bit = BigInt::from(1u8) << 255;
    if unsigned >= sign_bit {
        Ok(unsigned - (BigInt::from(1u8) << 256))
    } else {
        Ok(unsigned)
    }
}

/// Decodes a 32-byte hex word as an unsigned 256-bit integer.
pub fn decode_uint256(word: &str) -> Result<BigInt, DecodeError> {
    let clean = word.strip_prefix("0x").unwrap_or(word);
    BigInt::parse_bytes(clean.as_bytes(), 16)
        .ok_or_else(|| DecodeError::InvalidHex(word.to_string()))
}

fn data_word(data: &str, index: usize) -> Result<&str, DecodeError> {
    let start = index * WORD_HEX_LEN;
    let end = start + WORD_HEX_LEN;
    if data.len() < end {
        return Err(DecodeError::TruncatedData {
            need: end / 2,
            have: data.len() / 2,
        });
    }
    Ok(&data[start..end])
}

fn topic_at<'a>(log: &'a RawLog, index: usize) -> Result<&'a str, DecodeError> {
    log.topics
        .get(index)
        .map(|t| t.as_str())
        .ok_or(DecodeError::MissingTopic { index })
}

/// Extracts the 20-byte address padded into a 32-byte topic word.
fn address_from_topic(topic: &str) -> Result<Address, DecodeError> {
    let clean = topic.strip_prefix("0x").unwrap_or(topic);
    if clean.len() != WORD_HEX_LEN {
        return Err(DecodeError::InvalidHex(topic.to_string()));
    }
    Ok(Address::new(format!("0x{}", &clean[24..])))
}

fn pool_address(schema: &EventSchema, log: &RawLog) -> Result<Address, DecodeError> {
    match schema.pool_source {
        PoolSource::LogAddress => Ok(log.address.clone()),
        // Pool-id topics are kept whole: singleton protocols identify pools
        // by a 32-byte id, not an address.
        PoolSource::Topic(index) => Ok(Address::new(topic_at(log, index)?)),
    }
}

/// Net signed amounts per token from the four-amount unsigned layout:
/// amount in minus amount out, so a token the pool paid out comes back
/// negative just like the signed-pair layouts.
fn decode_unsigned_in_out(data: &str) -> Result<(BigInt, BigInt), DecodeError> {
    let amount0_in = decode_uint256(data_word(data, 0)?)?;
    let amount1_in = decode_uint256(data_word(data, 1)?)?;
    let amount0_out = decode_uint256(data_word(data, 2)?)?;
    let amount1_out = decode_uint256(data_word(data, 3)?)?;
    Ok((amount0_in - amount0_out, amount1_in - amount1_out))
}

fn decode_signed_pair(data: &str) -> Result<(BigInt, BigInt), DecodeError> {
    let amount0 = decode_int256(data_word(data, 0)?)?;
    let amount1 = decode_int256(data_word(data, 1)?)?;
    Ok((amount0, amount1))
}

/// Decodes one log. `Ok(None)` means the topic is not a known swap event;
/// any `Err` covers exactly this log and never the rest of the block.
pub fn decode_log(
    chain_id: ChainId,
    block: &BlockHeader,
    log: &RawLog,
    observed_at: DateTime<Utc>,
) -> Result<Option<DecodedSwapEvent>, DecodeError> {
    let Some(topic0) = log.topics.first() else {
        return Ok(None);
    };
    let Some(schema) = schema_for_topic(topic0) else {
        return Ok(None);
    };

    let data = log.data.strip_prefix("0x").unwrap_or(&log.data);
    let (token0_amount, token1_amount) = match schema.layout {
        AmountLayout::UnsignedInOut => decode_unsigned_in_out(data)?,
        AmountLayout::SignedPair => decode_signed_pair(data)?,
    };

    let sqrt_price = match schema.aux_price_word {
        Some(index) => Some(format!("0x{}", data_word(data, index)?)),
        None => None,
    };

    Ok(Some(DecodedSwapEvent {
        chain_id,
        block_number: block.number,
        block_hash: block.hash.clone(),
        block_timestamp: block.timestamp,
        observed_at,
        pool_address: pool_address(schema, log)?,
        sender_address: address_from_topic(topic_at(log, schema.sender_topic)?)?,
        token0_amount: token0_amount.to_string(),
        token1_amount: token1_amount.to_string(),
        protocol: schema.protocol,
        sqrt_price,
    }))
}

/// Decodes a full block's log set. Unknown topics are skipped silently,
/// malformed logs are skipped with a warning; neither aborts the batch.
pub fn decode_block_logs(
    chain_id: ChainId,
    block: &BlockHeader,
    logs: &[RawLog],
    observed_at: DateTime<Utc>,
) -> Vec<DecodedSwapEvent> {
    let mut events = Vec::new();
    for log in logs {
        match decode_log(chain_id, block, log, observed_at) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {
                debug!(chain_id = %chain_id, block = block.number, "skipping unrecognized log topic");
            }
            Err(e) => {
                warn!(
                    chain_id = %chain_id,
                    block = block.number,
                    address = %log.address,
                    error = %e,
                    "skipping malformed swap log"
                );
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::DexProtocol;

    const V2_TOPIC: &str = "0xd78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822";
    const V3_TOPIC: &str = "0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67";
    const V4_TOPIC: &str = "0x40e9cecb9f5f1f1c5b9c97dec2917b7ee92e57ba5563708daca94dd84ad7112f";

    fn word_from(value: &BigInt) -> String {
        let wrapped = if value.sign() == num_bigint::Sign::Minus {
            (BigInt::from(1u8) << 256) + value
        } else {
            value.clone()
        };
        format!("{:064x}", wrapped)
    }

    fn padded_topic(address: &str) -> String {
        let clean = address.strip_prefix("0x").unwrap_or(address);
        format!("0x{:0>64}", clean)
    }

    fn block() -> BlockHeader {
        BlockHeader {
            number: 19_000_000,
            hash: "0xabc".to_string(),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_int256_zero_and_minus_one() {
        let zero = "0".repeat(64);
        assert_eq!(decode_int256(&zero).unwrap(), BigInt::from(0));

        let all_ones = "f".repeat(64);
        assert_eq!(decode_int256(&all_ones).unwrap(), BigInt::from(-1));
    }

    #[test]
    fn test_int256_sign_boundary() {
        // 2^255 - 1 is the largest positive value.
        let max_positive = format!("7{}", "f".repeat(63));
        assert_eq!(
            decode_int256(&max_positive).unwrap(),
            (BigInt::from(1u8) << 255) - 1
        );

        // 2^255 wraps to -2^255.
        let min_negative = format!("8{}", "0".repeat(63));
        assert_eq!(
            decode_int256(&min_negative).unwrap(),
            -(BigInt::from(1u8) << 255usize)
        );
    }

    #[test]
    fn test_int256_round_trips_signed_values() {
        for value in [
            BigInt::from(1),
            BigInt::from(-1),
            BigInt::from(95),
            BigInt::from(-500_000_000_000_000_000i64),
        ] {
            assert_eq!(decode_int256(&word_from(&value)).unwrap(), value);
        }
    }

    #[test]
    fn test_v2_four_amount_selects_nonzero_pair() {
        let data = format!(
            "0x{}{}{}{}",
            word_from(&BigInt::from(100)), // amount0In
            word_from(&BigInt::from(0)),   // amount1In
            word_from(&BigInt::from(0)),   // amount0Out
            word_from(&BigInt::from(95)),  // amount1Out
        );
        let log = RawLog {
            address: Address::from("0xp00l"),
            topics: vec![V2_TOPIC.to_string(), padded_topic("0x5e4de5")],
            data,
        };
        let event = decode_log(ChainId(1), &block(), &log, Utc::now())
            .unwrap()
            .expect("recognized topic");

        assert_eq!(event.protocol, DexProtocol::UniswapV2);
        assert_eq!(event.token0_amount, "100");
        assert_eq!(event.token1_amount, "-95");
        assert_eq!(event.amount_in(), Some(BigInt::from(100)));
        assert_eq!(event.amount_out(), Some(BigInt::from(95)));
        assert_eq!(event.pool_address, Address::from("0xp00l"));
        assert!(event.sqrt_price.is_none());
    }

    #[test]
    fn test_v3_signed_pair_and_price_word() {
        let amount0 = BigInt::from(1_000_000);
        let amount1 = BigInt::from(-500_000_000_000_000_000i64);
        let sqrt_price = BigInt::from(1_234_567u64);
        let data = format!(
            "0x{}{}{}",
            word_from(&amount0),
            word_from(&amount1),
            word_from(&sqrt_price),
        );
        let log = RawLog {
            address: Address::from("0xpool3"),
            topics: vec![V3_TOPIC.to_string(), padded_topic("0xsender")],
            data,
        };
        let event = decode_log(ChainId(8453), &block(), &log, Utc::now())
            .unwrap()
            .unwrap();

        assert_eq!(event.protocol, DexProtocol::UniswapV3);
        assert_eq!(event.token0_amount, "1000000");
        assert_eq!(event.token1_amount, "-500000000000000000");
        assert_eq!(event.sqrt_price, Some(format!("0x{}", word_from(&sqrt_price))));
    }

    #[test]
    fn test_v4_pool_id_from_topic_and_sender_from_topic_two() {
        let data = format!(
            "0x{}{}{}",
            word_from(&BigInt::from(-42)),
            word_from(&BigInt::from(41)),
            word_from(&BigInt::from(7)),
        );
        let pool_id = format!("0x{}", "1d".repeat(32));
        let log = RawLog {
            address: Address::from("0xmanager"),
            topics: vec![
                V4_TOPIC.to_string(),
                pool_id.clone(),
                padded_topic("0xbeef"),
            ],
            data,
        };
        let event = decode_log(ChainId(1), &block(), &log, Utc::now())
            .unwrap()
            .unwrap();

        // The singleton manager emits the log; the pool id is the topic word.
        assert_eq!(event.pool_address, Address::new(&pool_id));
        assert_eq!(
            event.sender_address,
            Address::new(format!("0x{:0>40}", "beef"))
        );
    }

    #[test]
    fn test_unknown_topic_is_skipped_not_an_error() {
        let log = RawLog {
            address: Address::from("0x1"),
            topics: vec![format!("0x{}", "ab".repeat(32))],
            data: "0x".to_string(),
        };
        assert_eq!(decode_log(ChainId(1), &block(), &log, Utc::now()).unwrap(), None);
    }

    #[test]
    fn test_truncated_data_is_an_error_for_that_log_only() {
        let log = RawLog {
            address: Address::from("0x1"),
            topics: vec![V3_TOPIC.to_string(), padded_topic("0x2")],
            data: format!("0x{}", word_from(&BigInt::from(1))),
        };
        let err = decode_log(ChainId(1), &block(), &log, Utc::now()).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedData { .. }));

        // The malformed log is dropped from the batch, the rest survives.
        let good = RawLog {
            address: Address::from("0x2"),
            topics: vec![V2_TOPIC.to_string(), padded_topic("0x3")],
            data: format!(
                "0x{}{}{}{}",
                word_from(&BigInt::from(10)),
                word_from(&BigInt::from(0)),
                word_from(&BigInt::from(0)),
                word_from(&BigInt::from(9)),
            ),
        };
        let events = decode_block_logs(ChainId(1), &block(), &[log, good], Utc::now());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].token0_amount, "10");
    }
}
