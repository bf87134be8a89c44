//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: set on the builder in [`AppConfig::from_file`]
//! 2. **Config file**: TOML file named by the `PULSE_CONFIG` env var
//! 3. **Environment variables**: `PULSE__SECTION__FIELD` overrides a single field
//!
//! # Configuration Sections
//!
//! - [`ServerConfig`]: HTTP entrypoint bind address
//! - [`CollectionConfig`]: probe timeouts and the region probes run from
//! - [`PushConfig`]: metrics backend URL, credentials and retry schedule
//! - [`AuthConfig`]: bearer secret for the HTTP entrypoint
//! - [`LoggingConfig`]: log level and format
//!
//! Provider endpoints are not part of this file; they come from the endpoints
//! document (see [`endpoints`]).
//!
//! # Example
//!
//! ```toml
//! [collection]
//! source_region = "fra1"
//! max_latency_seconds = 20
//!
//! [push]
//! url = "https://influx.example.com/api/v1/push/influx/write"
//! user = "123456"
//! retries = 5
//! ```

pub mod endpoints;

pub use endpoints::{EndpointsDocument, EndpointsSource, ProviderEndpoint, ENDPOINTS_ENV};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};
use thiserror::Error;

use crate::{metric::MetricConfig, push::PushSettings};

/// Configuration and registry errors. These abort an invocation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(
        "no metrics registered for blockchain '{blockchain}'; available blockchains: [{}]",
        .available.join(", ")
    )]
    UnregisteredBlockchain { blockchain: String, available: Vec<String> },

    #[error("unknown blockchain '{name}'; supported: {}", .supported.join(", "))]
    UnknownBlockchain { name: String, supported: Vec<String> },

    #[error("ENDPOINTS environment variable is not set")]
    MissingEndpoints,

    #[error("invalid endpoints document: {0}")]
    InvalidEndpoints(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("provider {provider}: {reason}")]
    InvalidProviderData { provider: String, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP entrypoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Defaults to `127.0.0.1`.
    pub bind_address: String,

    /// Defaults to `3040`.
    pub bind_port: u16,
}

/// Probe settings shared by every metric of an invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Bound on each probe operation. Defaults to `30`.
    pub request_timeout_seconds: u64,

    /// Latencies above this are recorded as failures. Defaults to `30`.
    pub max_latency_seconds: u64,

    /// Value of the `source_region` label. Unset renders as `default`.
    #[serde(default)]
    pub source_region: Option<String>,

    /// Endpoints document path. When unset the document is read from `ENDPOINTS`.
    #[serde(default)]
    pub endpoints_file: Option<PathBuf>,
}

/// Metrics backend settings. Pushing is skipped unless `url`, `user` and
/// `api_key` are all set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Total delivery attempts. Defaults to `3`.
    pub retries: u32,

    /// Fixed wait between attempts. Defaults to `10`.
    pub retry_delay_seconds: u64,

    /// Per-attempt timeout. Defaults to `10`.
    pub timeout_seconds: u64,
}

/// Bearer authentication for the HTTP entrypoint.
///
/// When `api_secret` is unset every request is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub api_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Defaults to `"info"`.
    pub level: String,

    /// `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), bind_port: 3040 }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            max_latency_seconds: 30,
            source_region: None,
            endpoints_file: None,
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            api_key: None,
            retries: 3,
            retry_delay_seconds: 10,
            timeout_seconds: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Use `__` as a separator for nested fields (e.g. `PULSE__PUSH__RETRIES=5`).
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file cannot be parsed or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.bind_port", 3040)?
            .set_default("collection.request_timeout_seconds", 30)?
            .set_default("collection.max_latency_seconds", 30)?
            .set_default("push.retries", 3)?
            .set_default("push.retry_delay_seconds", 10)?
            .set_default("push.timeout_seconds", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("PULSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config_builder.try_deserialize()?)
    }

    /// Loads configuration from `config/config.toml`, or the file named by `PULSE_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("PULSE_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Returns the parsed socket address for the HTTP entrypoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, ConfigError> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port).parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid socket address: {}:{}",
                self.server.bind_address, self.server.bind_port
            ))
        })
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.collection.request_timeout_seconds == 0 {
            return invalid("collection.request_timeout_seconds must be greater than 0");
        }

        if self.collection.max_latency_seconds == 0 {
            return invalid("collection.max_latency_seconds must be greater than 0");
        }

        if self.push.retries == 0 {
            return invalid("push.retries must be greater than 0");
        }

        if self.push.timeout_seconds == 0 {
            return invalid("push.timeout_seconds must be greater than 0");
        }

        if let Some(url) = self.push.url.as_deref() {
            match url::Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                _ => return invalid("push.url must be an http(s) URL"),
            }
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return invalid("logging.format must be 'json' or 'pretty'");
        }

        Ok(())
    }

    #[must_use]
    pub fn metric_config(&self) -> MetricConfig {
        MetricConfig {
            timeout: Duration::from_secs(self.collection.request_timeout_seconds),
            max_latency: Duration::from_secs(self.collection.max_latency_seconds),
        }
    }

    #[must_use]
    pub fn push_settings(&self) -> PushSettings {
        PushSettings {
            url: self.push.url.clone(),
            user: self.push.user.clone(),
            api_key: self.push.api_key.clone(),
            retries: self.push.retries,
            retry_delay: Duration::from_secs(self.push.retry_delay_seconds),
            timeout: Duration::from_secs(self.push.timeout_seconds),
        }
    }

    #[must_use]
    pub fn source_region(&self) -> Option<&str> {
        self.collection.source_region.as_deref()
    }

    /// Where invocations read the endpoints document from.
    #[must_use]
    pub fn endpoints_source(&self) -> EndpointsSource {
        self.collection
            .endpoints_file
            .clone()
            .map_or(EndpointsSource::Env, EndpointsSource::File)
    }
}
