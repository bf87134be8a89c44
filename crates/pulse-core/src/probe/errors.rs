use std::time::Duration;
use thiserror::Error;

/// Errors raised while a single probe runs.
///
/// These never leave the owning metric instance: [`crate::metric::Metric::collect`]
/// turns every variant into a `failed` status label and a log line.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProbeError {
    /// Operation exceeded the configured timeout.
    #[error("request timeout")]
    Timeout,

    /// Could not reach the endpoint.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The provider has no endpoint of the kind this probe needs.
    #[error("no {0} endpoint configured")]
    MissingEndpoint(&'static str),

    /// HTTP-level error (anything other than 200).
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),

    /// Network-level error from the underlying HTTP client.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// WebSocket protocol or transport error after the handshake.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The connection closed before a message arrived.
    #[error("connection closed by provider")]
    ConnectionClosed,

    /// The subscription acknowledgment had no (or a null) result.
    #[error("subscription to {0} failed")]
    SubscriptionRejected(&'static str),

    /// The request body could not be encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Response could not be parsed or did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Measured latency is above the acceptance ceiling.
    #[error("latency {latency:.3}s exceeds maximum allowed {}s", .max.as_secs_f64())]
    LatencyExceeded { latency: f64, max: Duration },
}

impl ProbeError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Network(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` when the failure is likely to clear up on a later invocation.
    ///
    /// Transient: timeouts, transport errors, dropped connections, HTTP 5xx / 429.
    /// Everything else points at a provider or configuration problem.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout |
            Self::ConnectionFailed(_) |
            Self::Network(_) |
            Self::WebSocket(_) |
            Self::ConnectionClosed => true,
            Self::HttpStatus(status) => (500..=599).contains(status) || *status == 429,
            _ => false,
        }
    }

    /// Short, label-safe classification for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) | Self::Network(_) => "connection",
            Self::MissingEndpoint(_) => "missing_endpoint",
            Self::HttpStatus(_) => "http_status",
            Self::WebSocket(_) | Self::ConnectionClosed => "websocket",
            Self::SubscriptionRejected(_) => "subscription",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidResponse(_) => "invalid_response",
            Self::LatencyExceeded { .. } => "latency_exceeded",
        }
    }
}
