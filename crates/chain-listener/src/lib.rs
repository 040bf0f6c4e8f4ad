//! Per-chain block/log ingestion: live websocket subscriptions, the
//! table-driven swap-log decoder, and the watcher registry exposed to the
//! control plane.

pub mod connector;
pub mod decode;
pub mod rpc;
pub mod schema;
pub mod service;
pub mod watcher;

pub use connector::{ChainConnection, ChainConnector, Scheduler, TokioScheduler};
pub use decode::{decode_block_logs, decode_int256, decode_log};
pub use rpc::WsConnector;
pub use service::ListenerService;
pub use watcher::{ChainWatcher, ConnectionState, ReconnectPolicy};
