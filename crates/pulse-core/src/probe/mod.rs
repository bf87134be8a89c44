//! Latency probes.
//!
//! A probe performs one measurement attempt against one endpoint and reports
//! the raw latency in seconds. Acceptance (the `max_latency` ceiling) and label
//! bookkeeping are handled by [`crate::metric::Metric`].

pub mod errors;
pub mod http;
pub mod http_client;
pub mod websocket;

pub use errors::ProbeError;
pub use http::HttpProbe;
pub use http_client::{HttpClient, HttpClientConfig};
pub use websocket::{ChainSubscription, WebSocketProbe};

use async_trait::async_trait;

use crate::metric::MetricConfig;

/// One measurement strategy.
#[async_trait]
pub trait Probe: Send + Sync {
    /// JSON-RPC method (or subscription name) reported in the `api_method` label.
    fn api_method(&self) -> &str;

    /// Runs a single measurement.
    ///
    /// `Ok(None)` means the probe observed nothing new (for example a repeated
    /// block); it is neither a value nor a failure.
    ///
    /// # Errors
    ///
    /// Any transport, protocol or decoding failure.
    async fn run_once(&mut self, config: &MetricConfig) -> Result<Option<f64>, ProbeError>;
}
