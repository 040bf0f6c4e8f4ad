//! # Spread Bot Common Crate
//!
//! Shared data types, the error taxonomy, and the collaborator traits used
//! across the `spread-bot` workspace, plus in-memory collaborator
//! implementations for wiring and tests.

/// Module for the error taxonomy.
pub mod errors;

/// Module for in-memory collaborator implementations.
pub mod memory;

/// Module for collaborator traits.
pub mod traits;

/// Module for shared data structures and types.
pub mod types;

// Re-export key items for easier access.
pub use errors::{DecodeError, ExecutionError, PreflightError, QueueError, WatcherError};
pub use types::{Address, ChainId, DecodedSwapEvent, DexProtocol, EnrichedSwapEvent, Order};
