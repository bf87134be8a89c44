//! Blockchain → metric kinds mapping and the factory that instantiates them.

use serde_json::Value;
use std::sync::Arc;

use crate::{
    chains::{Blockchain, MetricKind},
    config::ConfigError,
    labels::{MetricLabels, DEFAULT_LABEL_VALUE},
    metric::{Metric, MetricConfig},
    probe::HttpClient,
};

/// A registered metric: what to measure and the name to report it under.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub kind: MetricKind,
    pub name: String,
}

impl MetricSpec {
    #[must_use]
    pub fn new(kind: MetricKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into() }
    }
}

/// Per-provider parameters handed to the factory.
///
/// Absent label values render as `default`.
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    pub provider: Option<String>,
    pub source_region: Option<String>,
    pub target_region: Option<String>,
    pub websocket_endpoint: Option<String>,
    pub http_endpoint: Option<String>,
    /// Provider-specific call data (`eth_call` target and calldata).
    pub tx_data: Option<Value>,
}

impl ProbeContext {
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.as_deref().unwrap_or(DEFAULT_LABEL_VALUE)
    }

    fn labels(&self, blockchain: Blockchain) -> MetricLabels {
        MetricLabels::new(
            self.source_region.as_deref().unwrap_or(DEFAULT_LABEL_VALUE),
            self.target_region.as_deref().unwrap_or(DEFAULT_LABEL_VALUE),
            blockchain.name(),
            self.provider_name(),
        )
    }
}

/// Registry of metric kinds per blockchain, in registration order.
///
/// Registration is additive: registering the same blockchain twice appends the
/// second list to the first.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    entries: Vec<(Blockchain, Vec<MetricSpec>)>,
}

impl MetricRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in catalogue for every supported chain.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for chain in Blockchain::ALL {
            registry.register(chain, chain.default_metrics());
        }
        registry
    }

    pub fn register(
        &mut self,
        blockchain: Blockchain,
        metrics: impl IntoIterator<Item = MetricSpec>,
    ) {
        match self.entries.iter_mut().find(|(chain, _)| *chain == blockchain) {
            Some((_, specs)) => specs.extend(metrics),
            None => self.entries.push((blockchain, metrics.into_iter().collect())),
        }
    }

    #[must_use]
    pub fn is_registered(&self, blockchain: Blockchain) -> bool {
        self.entries.iter().any(|(chain, _)| *chain == blockchain)
    }

    /// Registered metrics for one chain; empty when the chain is unknown.
    #[must_use]
    pub fn metrics(&self, blockchain: Blockchain) -> &[MetricSpec] {
        self.entries
            .iter()
            .find(|(chain, _)| *chain == blockchain)
            .map(|(_, specs)| specs.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn blockchains(&self) -> Vec<Blockchain> {
        self.entries.iter().map(|(chain, _)| *chain).collect()
    }

    /// Fails with the list of registered chains when `blockchain` is not one of them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnregisteredBlockchain`].
    pub fn ensure_registered(&self, blockchain: Blockchain) -> Result<(), ConfigError> {
        if self.is_registered(blockchain) {
            return Ok(());
        }
        Err(ConfigError::UnregisteredBlockchain {
            blockchain: blockchain.to_string(),
            available: self.blockchains().iter().map(ToString::to_string).collect(),
        })
    }

    /// Builds one metric instance per registered kind, in registration order.
    ///
    /// Each instance gets its own freshly built label set and shares `config`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnregisteredBlockchain`] if nothing was registered for `blockchain`
    /// - [`ConfigError::InvalidProviderData`] if a kind needs provider data that is missing
    pub fn create(
        &self,
        blockchain: Blockchain,
        config: &Arc<MetricConfig>,
        context: &ProbeContext,
        http_client: &Arc<HttpClient>,
    ) -> Result<Vec<Metric>, ConfigError> {
        self.ensure_registered(blockchain)?;

        self.metrics(blockchain)
            .iter()
            .map(|spec| {
                let probe = spec.kind.build(context, http_client)?;
                let labels = context.labels(blockchain);
                Ok(Metric::new(spec.name.clone(), labels, Arc::clone(config), probe))
            })
            .collect()
    }
}
