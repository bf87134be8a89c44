//! One collection invocation: build metrics for every provider of a chain, run
//! them concurrently, render, and push.

pub mod context;

pub use context::RunContext;

use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    chains::Blockchain,
    config::{AppConfig, ConfigError, EndpointsDocument},
    metric::MetricConfig,
    probe::{HttpClient, HttpClientConfig},
    push::{MetricsPusher, PushOutcome, SkipReason},
    registry::MetricRegistry,
};

/// What one invocation measured and what happened to the payload.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub run_id: Uuid,
    pub blockchain: Blockchain,
    /// Newline-joined line-protocol payload; empty when nothing was measured.
    pub payload: String,
    /// Number of metric instances created across all providers.
    pub instances: usize,
    pub reported: usize,
    pub failed: usize,
    pub push: PushOutcome,
}

/// Runs collection invocations against a shared registry, config and HTTP client.
pub struct CollectionOrchestrator {
    registry: Arc<MetricRegistry>,
    metric_config: Arc<MetricConfig>,
    source_region: Option<String>,
    http_client: Arc<HttpClient>,
    pusher: Option<MetricsPusher>,
}

impl CollectionOrchestrator {
    /// Creates an orchestrator that does not push.
    #[must_use]
    pub fn new(
        registry: Arc<MetricRegistry>,
        metric_config: MetricConfig,
        http_client: Arc<HttpClient>,
    ) -> Self {
        Self {
            registry,
            metric_config: Arc::new(metric_config),
            source_region: None,
            http_client,
            pusher: None,
        }
    }

    /// Wires an orchestrator from application configuration, pushing enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        registry: Arc<MetricRegistry>,
    ) -> Result<Self, ConfigError> {
        let http_client = HttpClient::with_config(&HttpClientConfig::default())
            .map(Arc::new)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let pusher = MetricsPusher::new(config.push_settings(), Arc::clone(&http_client));

        Ok(Self::new(registry, config.metric_config(), http_client)
            .with_source_region(config.source_region().map(str::to_string))
            .with_pusher(pusher))
    }

    #[must_use]
    pub fn with_source_region(mut self, source_region: Option<String>) -> Self {
        self.source_region = source_region;
        self
    }

    #[must_use]
    pub fn with_pusher(mut self, pusher: MetricsPusher) -> Self {
        self.pusher = Some(pusher);
        self
    }

    #[must_use]
    pub fn without_push(mut self) -> Self {
        self.pusher = None;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Runs one invocation for `blockchain`.
    ///
    /// Provider-level failures (bad provider data) are logged and skipped; probe
    /// failures are recorded on their metric. Delivery failures are reported in
    /// [`InvocationReport::push`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnregisteredBlockchain`] before creating any
    /// metric or touching the network.
    pub async fn run(
        &self,
        blockchain: Blockchain,
        endpoints: &EndpointsDocument,
    ) -> Result<InvocationReport, ConfigError> {
        self.registry.ensure_registered(blockchain)?;

        let mut context = RunContext::new(blockchain);
        let span = info_span!("collection", run_id = %context.run_id(), blockchain = %blockchain);

        async move {
            let document_region = endpoints.region.as_deref();
            let mut providers = 0usize;

            for provider in endpoints.providers_for(blockchain) {
                providers += 1;
                let probe_context =
                    provider.probe_context(self.source_region.as_deref(), document_region);

                match self.registry.create(
                    blockchain,
                    &self.metric_config,
                    &probe_context,
                    &self.http_client,
                ) {
                    Ok(metrics) => context.register(metrics),
                    Err(e) => {
                        error!(
                            provider = %provider.name,
                            error = %e,
                            "failed to create metrics for provider"
                        );
                    }
                }
            }

            info!(providers, instances = context.metrics().len(), "collection started");
            context.collect_all().await;

            let payload = context.payload();
            let push = match &self.pusher {
                Some(pusher) => pusher.push(&payload).await,
                None => PushOutcome::Skipped(SkipReason::Disabled),
            };

            let report = InvocationReport {
                run_id: context.run_id(),
                blockchain,
                payload,
                instances: context.metrics().len(),
                reported: context.reported_count(),
                failed: context.failed_count(),
                push,
            };
            info!(
                reported = report.reported,
                failed = report.failed,
                push = ?report.push,
                "collection finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }
}
