//! Mock WebSocket server for block-subscription probes.
//!
//! Replies are scripted per received text message: the Nth text frame a client
//! sends (counted across all connections) is answered with the Nth scripted
//! batch. Messages with no batch left get no reply.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::{collections::VecDeque, net::SocketAddr, sync::Arc};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};

type Script = Arc<Mutex<VecDeque<Vec<Message>>>>;

/// A mock WebSocket server for testing.
pub struct MockWebSocketServer {
    addr: SocketAddr,
    script: Script,
    received_messages: Arc<Mutex<Vec<Value>>>,
    server_handle: JoinHandle<()>,
    shutdown_tx: broadcast::Sender<()>,
}

impl MockWebSocketServer {
    /// Creates a new mock WebSocket server on a random available port.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to a local port or retrieve the bound address.
    pub async fn new() -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let script = Arc::new(Mutex::new(VecDeque::new()));
        let received_messages = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, _) = broadcast::channel(1);

        let server_handle = Self::spawn_server(
            listener,
            Arc::clone(&script),
            Arc::clone(&received_messages),
            shutdown_tx.subscribe(),
        );

        Ok(Self { addr, script, received_messages, server_handle, shutdown_tx })
    }

    fn spawn_server(
        listener: TcpListener,
        script: Script,
        received_messages: Arc<Mutex<Vec<Value>>>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        if let Ok((stream, _)) = result {
                            tokio::spawn(Self::handle_connection(
                                stream,
                                Arc::clone(&script),
                                Arc::clone(&received_messages),
                            ));
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        })
    }

    async fn handle_connection(
        stream: TcpStream,
        script: Script,
        received_messages: Arc<Mutex<Vec<Value>>>,
    ) {
        let Ok(ws_stream) = accept_async(stream).await else { return };
        let (mut write, mut read) = ws_stream.split();

        while let Some(result) = read.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let parsed = serde_json::from_str(text.as_str()).unwrap_or(Value::Null);
                    received_messages.lock().await.push(parsed);

                    let replies = script.lock().await.pop_front().unwrap_or_default();
                    for reply in replies {
                        if write.send(reply).await.is_err() {
                            return;
                        }
                    }
                }
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
    }

    /// Returns the WebSocket URL for connecting to this server.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Queues the messages sent in answer to the next unanswered client message.
    pub async fn reply_with(&self, messages: Vec<Value>) {
        let batch = messages.into_iter().map(|m| Message::Text(m.to_string().into())).collect();
        self.script.lock().await.push_back(batch);
    }

    /// Queues raw frames, e.g. a close frame.
    pub async fn reply_with_frames(&self, frames: Vec<Message>) {
        self.script.lock().await.push_back(frames);
    }

    /// Every text message received so far, parsed as JSON (`null` if it was not JSON).
    pub async fn received(&self) -> Vec<Value> {
        self.received_messages.lock().await.clone()
    }

    /// Methods of the received JSON-RPC requests, in order.
    pub async fn received_methods(&self) -> Vec<String> {
        self.received()
            .await
            .iter()
            .filter_map(|m| m.get("method").and_then(Value::as_str).map(str::to_string))
            .collect()
    }
}

impl Drop for MockWebSocketServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        self.server_handle.abort();
    }
}

/// Subscription acknowledgement carrying `subscription_id`.
#[must_use]
pub fn subscription_ack(subscription_id: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": subscription_id })
}

/// Response to an unsubscribe call.
#[must_use]
pub fn unsubscribe_ack(result: bool) -> Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result })
}

/// EVM `newHeads` notification for a block produced at `timestamp`.
#[must_use]
pub fn new_heads_notification(block_hash: &str, timestamp: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "eth_subscription",
        "params": {
            "subscription": "0x9ce59a13059e417087c02d3236a0b9cc",
            "result": {
                "number": "0x1b4",
                "hash": block_hash,
                "parentHash": format!("0x{:064x}", 1),
                "timestamp": format!("0x{timestamp:x}"),
            }
        }
    })
}

/// Solana `blockNotification` for a block produced at `block_time`.
#[must_use]
pub fn solana_block_notification(blockhash: &str, block_time: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "blockNotification",
        "params": {
            "subscription": 42,
            "result": {
                "context": { "slot": 112_301_554 },
                "value": {
                    "slot": 112_301_554,
                    "block": {
                        "blockhash": blockhash,
                        "blockTime": block_time,
                        "blockHeight": 101_210_751,
                    },
                    "err": null
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::connect_async;

    #[tokio::test]
    async fn test_replies_follow_script_order() {
        let server = MockWebSocketServer::new().await.unwrap();
        server.reply_with(vec![subscription_ack(json!("0xabc")), json!({"n": 1})]).await;
        server.reply_with(vec![unsubscribe_ack(true)]).await;

        let (mut ws, _) = connect_async(server.url()).await.unwrap();

        ws.send(Message::Text(json!({"method": "first"}).to_string().into())).await.unwrap();
        let first = ws.next().await.unwrap().unwrap();
        assert!(first.to_text().unwrap().contains("0xabc"));
        let second = ws.next().await.unwrap().unwrap();
        assert!(second.to_text().unwrap().contains("\"n\":1"));

        ws.send(Message::Text(json!({"method": "second"}).to_string().into())).await.unwrap();
        let third = ws.next().await.unwrap().unwrap();
        assert!(third.to_text().unwrap().contains("true"));

        assert_eq!(server.received_methods().await, ["first", "second"]);
    }
}
