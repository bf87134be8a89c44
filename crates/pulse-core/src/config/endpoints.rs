//! The endpoints document: which providers to probe, per blockchain.
//!
//! ```json
//! {
//!   "region": "us-east",
//!   "providers": [
//!     {
//!       "blockchain": "Ethereum",
//!       "name": "alchemy",
//!       "websocket_endpoint": "wss://eth-mainnet.example.com/ws/KEY",
//!       "http_endpoint": "https://eth-mainnet.example.com/v2/KEY",
//!       "data": {"to": "0x...", "data": "0x..."}
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use super::ConfigError;
use crate::{chains::Blockchain, registry::ProbeContext};

/// Environment variable holding the endpoints document as JSON.
pub const ENDPOINTS_ENV: &str = "ENDPOINTS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointsDocument {
    #[serde(default)]
    pub providers: Vec<ProviderEndpoint>,

    /// Region of the providers, reported as `target_region`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Chain name, matched case-insensitively.
    pub blockchain: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_endpoint: Option<String>,
    /// Provider-specific call data, e.g. the `eth_call` transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Overrides the document-level `region` for this provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl ProviderEndpoint {
    /// Factory parameters for this provider.
    #[must_use]
    pub fn probe_context(
        &self,
        source_region: Option<&str>,
        document_region: Option<&str>,
    ) -> ProbeContext {
        ProbeContext {
            provider: Some(self.name.clone()),
            source_region: source_region.map(str::to_string),
            target_region: self.region.as_deref().or(document_region).map(str::to_string),
            websocket_endpoint: self.websocket_endpoint.clone(),
            http_endpoint: self.http_endpoint.clone(),
            tx_data: self.data.clone(),
        }
    }
}

impl EndpointsDocument {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoints`] when `json` is not a valid document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::InvalidEndpoints`] if it is not a valid document.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    /// Reads the document from the `ENDPOINTS` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEndpoints`] if the variable is unset, or
    /// [`ConfigError::InvalidEndpoints`] if it is not a valid document.
    pub fn from_env() -> Result<Self, ConfigError> {
        let json = std::env::var(ENDPOINTS_ENV).map_err(|_| ConfigError::MissingEndpoints)?;
        Self::from_json(&json)
    }

    /// Providers configured for `blockchain`, in document order.
    pub fn providers_for(&self, blockchain: Blockchain) -> impl Iterator<Item = &ProviderEndpoint> {
        self.providers.iter().filter(move |p| blockchain.matches(&p.blockchain))
    }
}

/// Where an invocation reads its endpoints document from.
///
/// `Env` and `File` are re-read on every invocation so a long-running server
/// picks up changes without a restart.
#[derive(Debug, Clone)]
pub enum EndpointsSource {
    Env,
    File(PathBuf),
    Static(Arc<EndpointsDocument>),
}

impl EndpointsSource {
    /// # Errors
    ///
    /// Propagates the errors of the underlying loader.
    pub fn load(&self) -> Result<Arc<EndpointsDocument>, ConfigError> {
        match self {
            Self::Env => EndpointsDocument::from_env().map(Arc::new),
            Self::File(path) => EndpointsDocument::from_file(path).map(Arc::new),
            Self::Static(document) => Ok(Arc::clone(document)),
        }
    }
}
