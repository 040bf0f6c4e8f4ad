use common::types::ChainId;
use serde::{Deserialize, Serialize};

/// One chain to watch: its id and websocket endpoint.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub ws_url: String,
}

impl ChainConfig {
    pub fn chain_id(&self) -> ChainId {
        ChainId(self.chain_id)
    }
}

/// Reconnect policy for chain watchers.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatcherConfig {
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Per-call timeout for socket/RPC operations, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay_secs(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

/// Queue transport settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueueConfig {
    /// Consumer attempts per job before it is parked for inspection.
    #[serde(default = "default_queue_attempts")]
    pub max_attempts: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_queue_attempts(),
        }
    }
}

/// Enrichment settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EnricherConfig {
    /// Number of workers draining the ingestion queue.
    #[serde(default = "default_enricher_workers")]
    pub workers: usize,
    /// Oracle price cache refresh period, in seconds.
    #[serde(default = "default_price_refresh_secs")]
    pub price_refresh_secs: u64,
    /// Symbols refreshed into the price cache.
    #[serde(default = "default_priced_symbols")]
    pub priced_symbols: Vec<String>,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            workers: default_enricher_workers(),
            price_refresh_secs: default_price_refresh_secs(),
            priced_symbols: default_priced_symbols(),
        }
    }
}

/// Spread scanner thresholds.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScannerConfig {
    /// Minimum triggering swap size, USD.
    #[serde(default = "default_min_swap_size_usd")]
    pub min_swap_size_usd: u64,
    /// Profitability threshold in basis points.
    #[serde(default = "default_spread_threshold_bps")]
    pub spread_threshold_bps: u32,
    /// Strategy types whose routing queues get a scan consumer.
    #[serde(default = "default_strategy_kinds")]
    pub strategy_kinds: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_swap_size_usd: default_min_swap_size_usd(),
            spread_threshold_bps: default_spread_threshold_bps(),
            strategy_kinds: default_strategy_kinds(),
        }
    }
}

/// Swap execution settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExecutorConfig {
    /// Attempts per leg, no backoff between them.
    #[serde(default = "default_executor_retries")]
    pub max_retries: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_executor_retries(),
        }
    }
}

/// External HTTP endpoints.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GatewayConfig {
    pub aggregator_url: Option<String>,
    pub oracle_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

/// The top-level configuration struct that maps directly to the YAML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub enricher: EnricherConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for chain in &self.chains {
            if !chain.ws_url.starts_with("ws://") && !chain.ws_url.starts_with("wss://") {
                anyhow::bail!(
                    "chain {}: invalid websocket url {}",
                    chain.chain_id,
                    chain.ws_url
                );
            }
        }
        if self.enricher.workers == 0 {
            anyhow::bail!("enricher.workers must be at least 1");
        }
        if self.executor.max_retries == 0 {
            anyhow::bail!("executor.max_retries must be at least 1");
        }
        Ok(())
    }
}

pub async fn load_config_from_path(path: &str) -> Result<Config, anyhow::Error> {
    let config_str = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;
    Ok(config)
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_call_timeout_secs() -> u64 {
    5
}

fn default_queue_attempts() -> u32 {
    3
}

fn default_enricher_workers() -> usize {
    2
}

fn default_price_refresh_secs() -> u64 {
    30
}

fn default_priced_symbols() -> Vec<String> {
    vec!["ETH".to_string(), "BTC".to_string()]
}

fn default_min_swap_size_usd() -> u64 {
    50
}

fn default_spread_threshold_bps() -> u32 {
    20
}

fn default_strategy_kinds() -> Vec<String> {
    vec!["dd".to_string()]
}

fn default_executor_retries() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.chains.is_empty());
        assert_eq!(config.watcher.reconnect_delay_secs, 5);
        assert_eq!(config.watcher.max_reconnect_attempts, 5);
        assert_eq!(config.queue.max_attempts, 3);
        assert_eq!(config.scanner.min_swap_size_usd, 50);
        assert_eq!(config.scanner.spread_threshold_bps, 20);
        assert_eq!(config.executor.max_retries, 5);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_chains() {
        let yaml = r#"
chains:
  - chain_id: 1
    ws_url: wss://eth.example/ws
  - chain_id: 8453
    ws_url: wss://base.example/ws
scanner:
  min_swap_size_usd: 100
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.chains[1].chain_id(), ChainId(8453));
        assert_eq!(config.scanner.min_swap_size_usd, 100);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_http_url() {
        let yaml = r#"
chains:
  - chain_id: 1
    ws_url: https://eth.example
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
