use thiserror::Error;

/// Failures while decoding a single log. Each one skips exactly that log;
/// the rest of the block is unaffected.
#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("log data too short: need {need} bytes, have {have}")]
    TruncatedData { need: usize, have: usize },

    #[error("invalid hex word: {0}")]
    InvalidHex(String),

    #[error("missing topic at index {index}")]
    MissingTopic { index: usize },
}

/// Failures of a chain watcher's connection lifecycle.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("invalid websocket url: {0}, must start with ws:// or wss://")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    ConnectFailed(String),

    #[error("subscription closed by remote")]
    SubscriptionClosed,

    #[error("gave up reconnecting after {attempts} attempts")]
    AttemptsExhausted { attempts: u32 },
}

/// Failures of the queue transport.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue {0} is closed")]
    Closed(String),

    #[error("failed to serialize payload: {0}")]
    Serialize(String),
}

/// Preflight violations. Any of these fails the order before a single chain
/// call is made.
#[derive(Error, Debug, PartialEq)]
pub enum PreflightError {
    #[error("no balance record for token {token} on chain {chain_id}")]
    MissingBalanceRecord { token: String, chain_id: u64 },

    #[error("insufficient balance for token {token}: have {have}, need {need}")]
    InsufficientBalance {
        token: String,
        have: String,
        need: String,
    },

    #[error("insufficient allowance for token {token}: have {have}, need {need}")]
    InsufficientAllowance {
        token: String,
        have: String,
        need: String,
    },
}

/// A leg's swap execution exhausted its retry bound.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("leg {leg_index} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        leg_index: usize,
        attempts: u32,
        last_error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::TruncatedData { need: 128, have: 64 };
        assert_eq!(
            format!("{}", err),
            "log data too short: need 128 bytes, have 64"
        );
    }

    #[test]
    fn test_preflight_error_display() {
        let err = PreflightError::InsufficientBalance {
            token: "0xusdc".to_string(),
            have: "50".to_string(),
            need: "100".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "insufficient balance for token 0xusdc: have 50, need 100"
        );
    }

    #[test]
    fn test_watcher_error_display() {
        let err = WatcherError::AttemptsExhausted { attempts: 5 };
        assert_eq!(format!("{}", err), "gave up reconnecting after 5 attempts");
    }
}
