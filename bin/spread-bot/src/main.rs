use anyhow::Result;
use chain_listener::{ListenerService, ReconnectPolicy, TokioScheduler, WsConnector};
use clap::Parser;
use common::memory::InMemoryCatalog;
use common::traits::{DexAggregator, Notifier, PriceOracle};
use common::types::ChainId;
use detector::{ScanWorker, ScannerSettings, SpreadScanner};
use dex_gateway::{HttpDexAggregator, HttpPriceOracle, LogNotifier, TelegramNotifier};
use enricher::{EnrichWorker, EventEnricher, EventRouter, PriceCache};
use queue::{strategy_queue_name, QueueRegistry, BLOCK_EVENTS_QUEUE};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Command line arguments for spread-bot.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the bot configuration YAML
    #[arg(long, default_value = "config/default.yml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let cfg = config::load_config_from_path(&args.config).await?;
    cfg.validate()?;

    let queues = Arc::new(QueueRegistry::new(cfg.queue.max_attempts));

    // Collaborators. The catalog is owned by the persistence service in a
    // full deployment; the in-memory one keeps the pipeline self-contained.
    let catalog = Arc::new(InMemoryCatalog::new());
    let oracle: Arc<dyn PriceOracle> = Arc::new(match &cfg.gateway.oracle_url {
        Some(url) => HttpPriceOracle::new(url.clone())?,
        None => HttpPriceOracle::with_default_endpoint()?,
    });
    let notifier: Arc<dyn Notifier> =
        match (&cfg.gateway.telegram_bot_token, &cfg.gateway.telegram_chat_id) {
            (Some(token), Some(chat)) => Arc::new(TelegramNotifier::new(token.clone(), chat.clone())?),
            _ => Arc::new(LogNotifier),
        };

    // Price cache feeding enrichment, refreshed on its own task.
    let prices = Arc::new(PriceCache::new());
    let _price_task = prices.clone().spawn_refresh(
        oracle.clone(),
        cfg.enricher.priced_symbols.clone(),
        Duration::from_secs(cfg.enricher.price_refresh_secs),
    );

    // Enrichment workers drain the ingestion queue.
    let event_enricher = Arc::new(EventEnricher::new(catalog.clone(), prices.clone()));
    let enrich_worker = Arc::new(EnrichWorker::new(
        event_enricher,
        EventRouter::new(queues.clone()),
    ));
    let _enrich_tasks = queues.spawn_consumers(BLOCK_EVENTS_QUEUE, cfg.enricher.workers, enrich_worker);

    // One scan consumer per configured strategy type.
    match &cfg.gateway.aggregator_url {
        Some(url) => {
            let aggregator: Arc<dyn DexAggregator> = Arc::new(HttpDexAggregator::new(url.clone())?);
            let scanner = Arc::new(SpreadScanner::new(
                catalog.clone(),
                aggregator,
                ScannerSettings::from_bps(
                    cfg.scanner.min_swap_size_usd,
                    cfg.scanner.spread_threshold_bps,
                ),
            ));
            for kind in &cfg.scanner.strategy_kinds {
                queues.spawn_consumers(
                    &strategy_queue_name(kind),
                    1,
                    Arc::new(ScanWorker::new(scanner.clone())),
                );
            }
        }
        None => {
            warn!("no aggregator configured, spread scanning disabled");
        }
    }

    // Chain watchers.
    let listener = ListenerService::new(
        Arc::new(WsConnector::new(Duration::from_secs(
            cfg.watcher.call_timeout_secs,
        ))),
        Arc::new(TokioScheduler),
        queues.clone(),
        ReconnectPolicy {
            delay: Duration::from_secs(cfg.watcher.reconnect_delay_secs),
            max_attempts: cfg.watcher.max_reconnect_attempts,
        },
    );
    let chains: Vec<(ChainId, String)> = cfg
        .chains
        .iter()
        .map(|c| (c.chain_id(), c.ws_url.clone()))
        .collect();
    listener.configure_chains(&chains).await;
    for status in listener.status() {
        info!(chain_id = %status.chain_id, url = %status.rpc_url, active = status.active, "watcher status");
    }

    info!("spread-bot running, ctrl-c to stop");
    if let Err(e) = notifier
        .notify(&format!("spread-bot up, watching {} chains", chains.len()))
        .await
    {
        warn!(error = %e, "startup notification failed");
    }
    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    listener.stop_all().await;
    queues.close_all();
    if let Err(e) = notifier.notify("spread-bot stopped").await {
        warn!(error = %e, "shutdown notification failed");
    }
    Ok(())
}
