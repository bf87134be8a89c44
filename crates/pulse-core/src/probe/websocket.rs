use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, warn};

use crate::{
    metric::MetricConfig,
    probe::{Probe, ProbeError},
    types::JsonRpcRequest,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Chain-specific half of a block-latency subscription.
///
/// The probe owns the connection lifecycle; implementations only describe the
/// messages and how to read a block out of a notification.
pub trait ChainSubscription: Send + Sync {
    /// Subscription method, reported as the `api_method` label.
    fn api_method(&self) -> &'static str;

    fn subscribe_request(&self) -> JsonRpcRequest;

    /// Request that cancels `subscription_id`, or `None` when the chain needs no
    /// explicit unsubscribe.
    fn unsubscribe_request(&self, _subscription_id: &Value) -> Option<JsonRpcRequest> {
        None
    }

    /// Locates the block inside a notification's `params.result`.
    fn block<'a>(&self, result: &'a Value) -> &'a Value {
        result
    }

    /// Content key used for de-duplication (the block hash).
    fn block_key<'a>(&self, block: &'a Value) -> Option<&'a str>;

    /// Unix timestamp (seconds) at which the block was produced.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidResponse`] when the timestamp is missing or malformed.
    fn block_timestamp(&self, block: &Value) -> Result<i64, ProbeError>;
}

/// Measures how far behind wall-clock time the newest block pushed over a
/// WebSocket subscription is.
///
/// Each run connects, subscribes, waits for one message, and always attempts to
/// unsubscribe and close afterwards. Cleanup failures are logged and never
/// change the outcome of the run.
pub struct WebSocketProbe {
    endpoint: Option<String>,
    subscription: Box<dyn ChainSubscription>,
    last_block_hash: Option<String>,
    subscription_id: Option<Value>,
}

impl WebSocketProbe {
    #[must_use]
    pub fn new(endpoint: Option<String>, subscription: Box<dyn ChainSubscription>) -> Self {
        Self { endpoint, subscription, last_block_hash: None, subscription_id: None }
    }

    /// Hash of the last block that produced a sample.
    #[must_use]
    pub fn last_block_hash(&self) -> Option<&str> {
        self.last_block_hash.as_deref()
    }

    /// # Errors
    ///
    /// Returns an error if no WebSocket URL is configured, the URL is empty,
    /// or it does not start with `ws://` or `wss://`.
    fn validate_and_get_ws_url(&self) -> Result<&str, ProbeError> {
        let ws_url = self.endpoint.as_deref().ok_or(ProbeError::MissingEndpoint("websocket"))?;

        if ws_url.trim().is_empty() {
            return Err(ProbeError::MissingEndpoint("websocket"));
        }

        if !ws_url.starts_with("ws://") && !ws_url.starts_with("wss://") {
            return Err(ProbeError::InvalidRequest(
                "websocket url must start with ws:// or wss://".to_string(),
            ));
        }

        Ok(ws_url)
    }

    /// Opens the connection, bounded by `timeout`.
    ///
    /// Handshake errors are reduced to a category so endpoint URLs (which often
    /// carry API keys) never reach the logs.
    async fn connect_websocket(ws_url: &str, timeout: Duration) -> Result<WsStream, ProbeError> {
        let (stream, response) = tokio::time::timeout(timeout, connect_async(ws_url))
            .await
            .map_err(|_| ProbeError::Timeout)?
            .map_err(|e| ProbeError::ConnectionFailed(sanitize_handshake_error(&e)))?;

        debug!(status = response.status().as_u16(), "websocket connected");
        Ok(stream)
    }

    async fn send_request(ws: &mut WsStream, request: &JsonRpcRequest) -> Result<(), ProbeError> {
        let payload = serde_json::to_string(request)
            .map_err(|e| ProbeError::InvalidRequest(e.to_string()))?;
        debug!(method = %request.method, "sending websocket message");
        ws.send(Message::Text(payload.into()))
            .await
            .map_err(|e| ProbeError::WebSocket(format!("send failed: {e}")))
    }

    /// Waits for the next JSON message, skipping control frames.
    async fn next_json(ws: &mut WsStream, timeout: Duration) -> Result<Value, ProbeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let message = tokio::time::timeout_at(deadline, ws.next())
                .await
                .map_err(|_| ProbeError::Timeout)?;

            let parsed = match message {
                None | Some(Ok(Message::Close(_))) => return Err(ProbeError::ConnectionClosed),
                Some(Err(e)) => return Err(ProbeError::WebSocket(e.to_string())),
                Some(Ok(Message::Text(text))) => serde_json::from_str(text.as_str()),
                Some(Ok(Message::Binary(data))) => serde_json::from_slice(&data),
                Some(Ok(_)) => continue,
            };
            return parsed
                .map_err(|e| ProbeError::InvalidResponse(format!("message is not JSON: {e}")));
        }
    }

    async fn subscribe(&mut self, ws: &mut WsStream, timeout: Duration) -> Result<(), ProbeError> {
        Self::send_request(ws, &self.subscription.subscribe_request()).await?;

        let ack = Self::next_json(ws, timeout).await?;
        match ack.get("result") {
            Some(id) if !id.is_null() => {
                debug!(subscription_id = %id, "subscription confirmed");
                self.subscription_id = Some(id.clone());
                Ok(())
            }
            _ => Err(ProbeError::SubscriptionRejected(self.subscription.api_method())),
        }
    }

    /// Reads one message. Returns the block timestamp when it is a notification
    /// for a block not seen before.
    async fn listen_for_data(
        &mut self,
        ws: &mut WsStream,
        timeout: Duration,
    ) -> Result<Option<i64>, ProbeError> {
        let message = Self::next_json(ws, timeout).await?;

        let Some(result) = message.get("params").and_then(|p| p.get("result")) else {
            debug!("message is not a subscription notification");
            return Ok(None);
        };

        let block = self.subscription.block(result);
        let Some(hash) = self.subscription.block_key(block) else {
            debug!("notification carries no block hash");
            return Ok(None);
        };

        if self.last_block_hash.as_deref() == Some(hash) {
            debug!(block_hash = hash, "duplicate block, no sample");
            return Ok(None);
        }
        self.last_block_hash = Some(hash.to_string());

        self.subscription.block_timestamp(block).map(Some)
    }

    async fn measure(
        &mut self,
        ws: &mut WsStream,
        timeout: Duration,
    ) -> Result<Option<f64>, ProbeError> {
        self.subscribe(ws, timeout).await?;
        let timestamp = self.listen_for_data(ws, timeout).await?;
        Ok(timestamp.map(|ts| block_latency(ts, Utc::now())))
    }

    async fn unsubscribe(
        &mut self,
        ws: &mut WsStream,
        timeout: Duration,
    ) -> Result<(), ProbeError> {
        let Some(id) = self.subscription_id.take() else {
            return Ok(());
        };
        let Some(request) = self.subscription.unsubscribe_request(&id) else {
            return Ok(());
        };

        Self::send_request(ws, &request).await?;
        let response = Self::next_json(ws, timeout).await?;
        if response.get("result").and_then(Value::as_bool).unwrap_or(false) {
            debug!("unsubscribed");
        } else {
            warn!(subscription_id = %id, "unsubscribe call failed or returned false");
        }
        Ok(())
    }

    async fn cleanup(&mut self, ws: &mut WsStream, timeout: Duration) {
        if let Err(e) = self.unsubscribe(ws, timeout).await {
            error!(error = %e, "error unsubscribing websocket");
        }

        match tokio::time::timeout(timeout, ws.close(None)).await {
            Ok(Ok(())) | Ok(Err(tungstenite::Error::ConnectionClosed)) => {}
            Ok(Err(e)) => error!(error = %e, "error closing websocket"),
            Err(_) => error!("timed out closing websocket"),
        }
    }
}

#[async_trait]
impl Probe for WebSocketProbe {
    fn api_method(&self) -> &str {
        self.subscription.api_method()
    }

    async fn run_once(&mut self, config: &MetricConfig) -> Result<Option<f64>, ProbeError> {
        let ws_url = self.validate_and_get_ws_url()?.to_string();
        self.subscription_id = None;

        let mut ws = Self::connect_websocket(&ws_url, config.timeout).await?;
        let outcome = self.measure(&mut ws, config.timeout).await;
        self.cleanup(&mut ws, config.timeout).await;

        outcome
    }
}

/// Seconds between the block timestamp and `now`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn block_latency(block_timestamp: i64, now: DateTime<Utc>) -> f64 {
    now.timestamp_micros().saturating_sub(block_timestamp.saturating_mul(1_000_000)) as f64 /
        1_000_000.0
}

fn sanitize_handshake_error(error: &tungstenite::Error) -> String {
    match error {
        tungstenite::Error::Http(response) => {
            format!("websocket upgrade rejected with status {}", response.status().as_u16())
        }
        tungstenite::Error::Io(_) => "connection refused or unreachable".to_string(),
        tungstenite::Error::Tls(_) => "tls handshake failed".to_string(),
        tungstenite::Error::Url(_) => "invalid websocket url".to_string(),
        _ => "websocket handshake failed".to_string(),
    }
}
