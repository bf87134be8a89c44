use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

use crate::{
    metric::MetricConfig,
    probe::{HttpClient, Probe, ProbeError},
    types::{JsonRpcRequest, JsonRpcResponse},
};

/// Measures the round trip of a single JSON-RPC call over HTTP.
///
/// Latency runs from just before the request is sent to just after a `200`
/// body has been read and parsed as JSON. Any other status is a failure.
pub struct HttpProbe {
    client: Arc<HttpClient>,
    endpoint: Option<String>,
    request: JsonRpcRequest,
    require_result: bool,
}

impl HttpProbe {
    #[must_use]
    pub fn new(client: Arc<HttpClient>, endpoint: Option<String>, request: JsonRpcRequest) -> Self {
        Self { client, endpoint, request, require_result: false }
    }

    /// Also fail when the response carries no (or a `null`) `result`.
    #[must_use]
    pub fn requiring_result(mut self) -> Self {
        self.require_result = true;
        self
    }

    #[must_use]
    pub fn request(&self) -> &JsonRpcRequest {
        &self.request
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn api_method(&self) -> &str {
        &self.request.method
    }

    async fn run_once(&mut self, config: &MetricConfig) -> Result<Option<f64>, ProbeError> {
        let endpoint = self.endpoint.as_deref().ok_or(ProbeError::MissingEndpoint("http"))?;
        let body = serde_json::to_vec(&self.request)
            .map(Bytes::from)
            .map_err(|e| ProbeError::InvalidRequest(e.to_string()))?;

        debug!(method = %self.request.method, "sending http probe request");
        let response = self.client.post_json(endpoint, body, config.timeout).await?;

        if response.status != 200 {
            return Err(ProbeError::HttpStatus(response.status));
        }

        let parsed: JsonRpcResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ProbeError::InvalidResponse(format!("body is not JSON-RPC: {e}")))?;
        let latency = response.started.elapsed().as_secs_f64();

        if self.require_result && parsed.non_null_result().is_none() {
            let reason = parsed
                .error
                .map_or_else(|| "response is empty".to_string(), |e| e.message);
            return Err(ProbeError::InvalidResponse(reason));
        }

        Ok(Some(latency))
    }
}
