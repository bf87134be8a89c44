use bytes::Bytes;
use reqwest::{header, Client, ClientBuilder};
use std::time::{Duration, Instant};

use crate::probe::ProbeError;

const USER_AGENT: &str = concat!("pulse/", env!("CARGO_PKG_VERSION"));

/// Connection behavior of the shared HTTP client.
///
/// There is no in-process concurrency limit: every probe of an invocation must
/// be on the wire within its own timeout, so a slow provider can never delay
/// the send of another one.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// How long an idle pooled connection is kept.
    pub pool_idle_timeout: Duration,
    /// Optional cap on TCP + TLS connect. When unset, connecting is bounded only
    /// by the per-request timeout.
    pub connect_timeout: Option<Duration>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self { pool_idle_timeout: Duration::from_secs(30), connect_timeout: None }
    }
}

/// A response whose body has been fully read.
///
/// `started` is taken right before the request was sent.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
    pub started: Instant,
}

/// Shared HTTP client.
///
/// One instance is shared by every HTTP probe and the metrics pusher of a
/// process. Requests never retry here: a probe is a single measured attempt and
/// the pusher owns its own retry schedule.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, ProbeError> {
        Self::with_config(&HttpClientConfig::default())
    }

    /// Creates a new HTTP client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: &HttpClientConfig) -> Result<Self, ProbeError> {
        let mut builder = ClientBuilder::new()
            .pool_idle_timeout(config.pool_idle_timeout)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .tcp_nodelay(true);

        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let client = builder.build().map_err(|e| {
            tracing::error!(error = %e, "failed to build http client");
            ProbeError::ConnectionFailed(format!("HTTP client build failed: {e}"))
        })?;

        Ok(Self { client })
    }

    /// Sanitizes network errors so endpoint URLs (which often embed API keys)
    /// never reach logs or pushed data.
    fn sanitize_network_error(error: &reqwest::Error) -> String {
        if error.is_connect() {
            "connection refused or unreachable".to_string()
        } else if error.is_timeout() {
            "connection timed out".to_string()
        } else if error.is_request() {
            "request failed".to_string()
        } else if error.is_body() {
            "response body error".to_string()
        } else if error.is_decode() {
            "response decode error".to_string()
        } else if error.is_redirect() {
            "unexpected redirect".to_string()
        } else {
            "network error".to_string()
        }
    }

    fn map_send_error(error: &reqwest::Error) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout
        } else {
            ProbeError::ConnectionFailed(Self::sanitize_network_error(error))
        }
    }

    /// Sends a JSON POST and reads the whole body, whatever the status.
    ///
    /// `timeout` bounds the whole exchange, connect and body read included.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::Timeout`] if the request or the body read times out
    /// - [`ProbeError::ConnectionFailed`] for transport failures (sanitized)
    pub async fn post_json(
        &self,
        url: &str,
        body: Bytes,
        timeout: Duration,
    ) -> Result<HttpResponse, ProbeError> {
        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| Self::map_send_error(&e))?;

        Ok(HttpResponse { status, body, started })
    }

    /// Sends a `text/plain` POST with basic auth and returns the status code.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::post_json`].
    pub async fn post_text(
        &self,
        url: &str,
        body: String,
        user: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<u16, ProbeError> {
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "text/plain")
            .basic_auth(user, Some(password))
            .body(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        Ok(response.status().as_u16())
    }
}
