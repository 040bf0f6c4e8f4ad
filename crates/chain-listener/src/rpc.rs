//! Live chain connection: JSON-RPC over WebSocket. Subscribes to `newHeads`
//! and fetches each announced block's logs over the same socket. Every
//! outbound call is bounded by a short timeout; waiting for the next head is
//! not a call and waits as long as the chain does.

use crate::connector::{ChainConnection, ChainConnector};
use async_trait::async_trait;
use common::errors::WatcherError;
use common::types::{Address, BlockHeader, RawLog};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector producing [`WsConnection`]s.
pub struct WsConnector {
    call_timeout: Duration,
}

impl WsConnector {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }
}

#[async_trait]
impl ChainConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn ChainConnection>, WatcherError> {
        let (ws, _) = timeout(self.call_timeout, connect_async(url))
            .await
            .map_err(|_| WatcherError::ConnectFailed("connect timed out".to_string()))?
            .map_err(|e| WatcherError::ConnectFailed(e.to_string()))?;

        let mut conn = WsConnection {
            ws,
            next_id: 1,
            sub_id: None,
            pending_blocks: VecDeque::new(),
            call_timeout: self.call_timeout,
        };
        conn.subscribe_new_heads().await?;
        Ok(Box::new(conn))
    }
}

pub struct WsConnection {
    ws: WsStream,
    next_id: u64,
    sub_id: Option<String>,
    /// Heads announced while a call response was being awaited.
    pending_blocks: VecDeque<BlockHeader>,
    call_timeout: Duration,
}

impl WsConnection {
    async fn subscribe_new_heads(&mut self) -> Result<(), WatcherError> {
        let result = self.call("eth_subscribe", json!(["newHeads"])).await?;
        let sub_id = result
            .as_str()
            .ok_or_else(|| WatcherError::ConnectFailed("non-string subscription id".to_string()))?;
        self.sub_id = Some(sub_id.to_string());
        debug!(subscription = sub_id, "newHeads subscription established");
        Ok(())
    }

    /// Sends one JSON-RPC request and reads frames until its response
    /// arrives. Head notifications seen in between are buffered, not lost.
    async fn call(&mut self, method: &str, params: Value) -> Result<Value, WatcherError> {
        let id = self.next_id;
        self.next_id += 1;
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        timeout(self.call_timeout, self.ws.send(Message::Text(request.to_string())))
            .await
            .map_err(|_| WatcherError::ConnectFailed(format!("{method} send timed out")))?
            .map_err(|e| WatcherError::ConnectFailed(e.to_string()))?;

        loop {
            let frame = timeout(self.call_timeout, self.ws.next())
                .await
                .map_err(|_| WatcherError::ConnectFailed(format!("{method} response timed out")))?;
            let message = match frame {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(WatcherError::ConnectFailed(e.to_string())),
                None => return Err(WatcherError::SubscriptionClosed),
            };
            match self.handle_frame(message).await? {
                Some(value) if value.get("id").and_then(Value::as_u64) == Some(id) => {
                    if let Some(error) = value.get("error") {
                        return Err(WatcherError::ConnectFailed(format!(
                            "{method} rpc error: {error}"
                        )));
                    }
                    return Ok(value.get("result").cloned().unwrap_or(Value::Null));
                }
                _ => continue,
            }
        }
    }

    /// Processes one frame: buffers head notifications, answers pings, and
    /// returns parsed call responses to the caller.
    async fn handle_frame(&mut self, message: Message) -> Result<Option<Value>, WatcherError> {
        match message {
            Message::Text(text) => {
                let value: Value = match serde_json::from_str(&text) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(error = %e, "dropping unparseable frame");
                        return Ok(None);
                    }
                };
                if value.get("method").and_then(Value::as_str) == Some("eth_subscription") {
                    if let Some(header) = value
                        .pointer("/params/result")
                        .and_then(parse_block_header)
                    {
                        self.pending_blocks.push_back(header);
                    }
                    return Ok(None);
                }
                Ok(Some(value))
            }
            Message::Ping(payload) => {
                let _ = self.ws.send(Message::Pong(payload)).await;
                Ok(None)
            }
            Message::Close(_) => Err(WatcherError::SubscriptionClosed),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ChainConnection for WsConnection {
    async fn next_block(&mut self) -> Result<BlockHeader, WatcherError> {
        loop {
            if let Some(header) = self.pending_blocks.pop_front() {
                return Ok(header);
            }
            // No timeout here: a quiet chain simply has no new head yet.
            let frame = self.ws.next().await;
            let message = match frame {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(WatcherError::ConnectFailed(e.to_string())),
                None => return Err(WatcherError::SubscriptionClosed),
            };
            self.handle_frame(message).await?;
        }
    }

    async fn fetch_logs(&mut self, block_number: u64) -> Result<Vec<RawLog>, WatcherError> {
        let block_hex = format!("0x{block_number:x}");
        let result = self
            .call(
                "eth_getLogs",
                json!([{ "fromBlock": block_hex, "toBlock": block_hex }]),
            )
            .await?;
        let entries = result
            .as_array()
            .ok_or_else(|| WatcherError::ConnectFailed("eth_getLogs: non-array result".to_string()))?;
        Ok(entries.iter().filter_map(parse_raw_log).collect())
    }

    async fn close(&mut self) {
        if let Some(sub_id) = self.sub_id.take() {
            let request = json!({
                "jsonrpc": "2.0",
                "id": self.next_id,
                "method": "eth_unsubscribe",
                "params": [sub_id],
            });
            // Best effort: the socket is going away either way.
            let _ = timeout(
                Duration::from_millis(500),
                self.ws.send(Message::Text(request.to_string())),
            )
            .await;
        }
        let _ = self.ws.close(None).await;
    }
}

fn hex_to_u64(value: &Value) -> Option<u64> {
    let s = value.as_str()?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16).ok()
}

/// Parses a `newHeads` notification payload.
fn parse_block_header(value: &Value) -> Option<BlockHeader> {
    Some(BlockHeader {
        number: hex_to_u64(value.get("number")?)?,
        hash: value.get("hash")?.as_str()?.to_string(),
        timestamp: hex_to_u64(value.get("timestamp")?)? as i64,
    })
}

/// Parses one `eth_getLogs` entry; malformed entries are dropped.
fn parse_raw_log(value: &Value) -> Option<RawLog> {
    let topics = value
        .get("topics")?
        .as_array()?
        .iter()
        .filter_map(|t| t.as_str().map(str::to_string))
        .collect();
    Some(RawLog {
        address: Address::new(value.get("address")?.as_str()?),
        topics,
        data: value.get("data")?.as_str()?.to_string(),
    })
}
