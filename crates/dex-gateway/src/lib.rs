//! HTTP-backed collaborator clients: the DEX-aggregator API, the spot-price
//! oracle, and notification delivery.

pub mod aggregator;
pub mod notify;
pub mod oracle;

pub use aggregator::HttpDexAggregator;
pub use notify::{LogNotifier, TelegramNotifier};
pub use oracle::HttpPriceOracle;
