//! JSON-RPC mocks for HTTP probe testing.
//!
//! [`RpcMockBuilder`] wraps mockito and matches on the `method` field.
//! [`DelayedRpcServer`] is a real axum server that answers after a fixed delay,
//! for tests that assert on measured latency.
//! [`SilentRpcServer`] holds connections open without ever replying.

use axum::{extract::State, routing::post, Json, Router};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{net::TcpListener, task::JoinHandle};

/// Builder for mock JSON-RPC responses keyed by method name.
pub struct RpcMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl RpcMockBuilder {
    /// Creates a new RPC mock builder with a fresh mockito server.
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    /// Returns the URL of the mock server.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn method_matcher(method: &str) -> Matcher {
        Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#))
    }

    /// Answers `method` with `{"result": result}`.
    pub fn mock_result(&mut self, method: &str, result: Value) -> &mut Self {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string();
        self.mock_body(method, 200, &body)
    }

    /// Answers `method` with a JSON-RPC error object.
    pub fn mock_error(&mut self, method: &str, code: i64, message: &str) -> &mut Self {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message }
        })
        .to_string();
        self.mock_body(method, 200, &body)
    }

    /// Answers `method` with an arbitrary status and body.
    pub fn mock_body(&mut self, method: &str, status: usize, body: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(Self::method_matcher(method))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks `eth_blockNumber`.
    pub fn mock_block_number(&mut self, block_number: u64) -> &mut Self {
        self.mock_result("eth_blockNumber", json!(format!("0x{block_number:x}")))
    }

    /// Mocks `eth_call` returning `data`.
    pub fn mock_eth_call(&mut self, data: &str) -> &mut Self {
        self.mock_result("eth_call", json!(data))
    }

    /// Asserts every registered mock was hit as expected.
    pub async fn assert_all(&self) {
        for mock in &self.mocks {
            mock.assert_async().await;
        }
    }
}

#[derive(Clone)]
struct DelayedState {
    delay: Duration,
    result: Value,
    hits: Arc<AtomicUsize>,
}

/// JSON-RPC server that answers every request with the same result after
/// `delay`.
pub struct DelayedRpcServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl DelayedRpcServer {
    /// Starts the server on a random local port.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to a local port.
    pub async fn start(delay: Duration, result: Value) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let hits = Arc::new(AtomicUsize::new(0));

        let state = DelayedState { delay, result, hits: Arc::clone(&hits) };
        let app = Router::new().route("/", post(handle_delayed)).with_state(state);
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, hits, handle })
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Number of requests answered so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for DelayedRpcServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_delayed(
    State(state): State<DelayedState>,
    Json(request): Json<Value>,
) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.delay).await;
    Json(json!({
        "jsonrpc": "2.0",
        "id": request.get("id").cloned().unwrap_or(json!(1)),
        "result": state.result,
    }))
}

/// Accepts connections and never answers, like a provider that hangs after
/// the TCP handshake.
pub struct SilentRpcServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl SilentRpcServer {
    /// Starts the listener on a random local port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind to a local port.
    pub async fn start() -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        let handle = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                open.push(stream);
            }
        });

        Ok(Self { addr, accepted, handle })
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Connections accepted so far.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for SilentRpcServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
