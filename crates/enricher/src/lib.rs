//! Enrichment and routing of decoded swap events: catalog resolution, USD
//! sizing against cached oracle prices, and fan-out onto per-strategy
//! queues.

pub mod enrich;
pub mod prices;
pub mod router;
pub mod worker;

pub use enrich::{EnrichOutcome, EventEnricher, SkipReason};
pub use prices::PriceCache;
pub use router::EventRouter;
pub use worker::EnrichWorker;
