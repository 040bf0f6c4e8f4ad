//! Spread detection over a strategy's pools.

pub mod scanner;
pub mod service;

pub use scanner::{ScanOutcome, ScannerSettings, SpreadScanner};
pub use service::ScanWorker;
